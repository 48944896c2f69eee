//! Payment discovery (recipient side).
//!
//! A recipient holding the viewing private key and spending public key can
//! tell which announcements are addressed to them; spending requires the
//! spending private key as well.

use serde::{Deserialize, Serialize};

use shadow_core::error::{Result, ShadowError};
use shadow_core::types::{Announcement, EthAddress, KeyPair, OwnedStealthAddress, PrivateKey, PublicKey};
use shadow_crypto::{
    derive_stealth_private_key, key_pair_from_private_key, shared_secret, verify_stealth_address,
    verify_view_tag, SharedSecret,
};

/// Result of scanning a single announcement.
#[derive(Debug)]
pub enum ScanResult {
    /// Scheme other than secp256k1; skipped without any curve work
    UnsupportedScheme(u64),
    /// View tag present and different from ours
    ViewTagMismatch,
    /// View tag matched (or was absent) but the address is someone else's
    NotForUs,
    /// The announced stealth address is controlled by this recipient
    Discovered(OwnedStealthAddress),
    /// The record could not be processed
    Failed(ShadowError),
}

impl ScanResult {
    /// Returns true if a payment was discovered.
    pub fn is_discovered(&self) -> bool {
        matches!(self, ScanResult::Discovered(_))
    }

    /// Returns the owned stealth address if present.
    pub fn into_owned(self) -> Option<OwnedStealthAddress> {
        match self {
            ScanResult::Discovered(owned) => Some(owned),
            _ => None,
        }
    }
}

/// Counters for a scanning session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total announcements examined
    pub total_scanned: u64,
    /// Skipped for an unsupported scheme id
    pub unsupported_scheme: u64,
    /// Rejected by the view tag alone
    pub view_tag_filtered: u64,
    /// Passed the view tag but belong to someone else
    pub not_for_us: u64,
    /// Malformed or otherwise unprocessable records
    pub malformed: u64,
    /// Payments discovered
    pub discoveries: u64,
    /// Wall-clock duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates an empty stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scan result.
    pub fn record(&mut self, result: &ScanResult) {
        self.total_scanned += 1;
        match result {
            ScanResult::UnsupportedScheme(_) => self.unsupported_scheme += 1,
            ScanResult::ViewTagMismatch => self.view_tag_filtered += 1,
            ScanResult::NotForUs => self.not_for_us += 1,
            ScanResult::Discovered(_) => self.discoveries += 1,
            ScanResult::Failed(_) => self.malformed += 1,
        }
    }

    /// Adds another session's counters to this one.
    pub fn merge(&mut self, other: &ScanStats) {
        self.total_scanned += other.total_scanned;
        self.unsupported_scheme += other.unsupported_scheme;
        self.view_tag_filtered += other.view_tag_filtered;
        self.not_for_us += other.not_for_us;
        self.malformed += other.malformed;
        self.discoveries += other.discoveries;
    }

    /// Returns the scan rate (announcements per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Percentage of announcements rejected by the view tag alone.
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            (self.view_tag_filtered as f64 / self.total_scanned as f64) * 100.0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECOVERY
// ═══════════════════════════════════════════════════════════════════════════════

fn announcement_secret(viewing_sk: &PrivateKey, ephemeral_pk: &PublicKey) -> Result<SharedSecret> {
    shared_secret(viewing_sk, ephemeral_pk).map_err(|e| match e {
        ShadowError::InvalidPublicKey(msg) => {
            ShadowError::AnnouncementParseError(format!("ephemeral public key: {msg}"))
        }
        other => other,
    })
}

/// Checks whether an announcement's stealth address belongs to this recipient.
///
/// Returns the stealth address when it does, `None` otherwise. The view tag
/// is not consulted.
///
/// # Errors
/// `AnnouncementParseError` if the ephemeral key is not a valid point.
pub fn try_recover_stealth_address(
    viewing_sk: &PrivateKey,
    spending_pk: &PublicKey,
    announcement: &Announcement,
) -> Result<Option<EthAddress>> {
    let ephemeral = announcement.ephemeral_key()?;
    let secret = announcement_secret(viewing_sk, &ephemeral)?;

    if verify_stealth_address(spending_pk, &secret, &announcement.stealth_address)? {
        Ok(Some(announcement.stealth_address))
    } else {
        Ok(None)
    }
}

/// Classifies one announcement for this recipient. Never panics.
pub fn scan_announcement(
    announcement: &Announcement,
    viewing_sk: &PrivateKey,
    spending_pk: &PublicKey,
) -> ScanResult {
    if !announcement.is_supported_scheme() {
        return ScanResult::UnsupportedScheme(announcement.scheme_id);
    }

    let ephemeral = match announcement.ephemeral_key() {
        Ok(pk) => pk,
        Err(e) => return ScanResult::Failed(e),
    };

    let secret = match announcement_secret(viewing_sk, &ephemeral) {
        Ok(secret) => secret,
        Err(e) => return ScanResult::Failed(e),
    };

    // Empty metadata carries no tag; fall through to the full check
    if let Some(tag) = announcement.view_tag() {
        if !verify_view_tag(&secret, tag) {
            return ScanResult::ViewTagMismatch;
        }
    }

    match verify_stealth_address(spending_pk, &secret, &announcement.stealth_address) {
        Ok(true) => ScanResult::Discovered(OwnedStealthAddress {
            stealth_address: announcement.stealth_address,
            ephemeral_public_key: ephemeral,
            announcement: announcement.clone(),
        }),
        Ok(false) => ScanResult::NotForUs,
        Err(e) => ScanResult::Failed(e),
    }
}

/// Scans a slice of announcements sequentially, returning the owned ones in order.
pub fn scan_announcements(
    announcements: &[Announcement],
    viewing_sk: &PrivateKey,
    spending_pk: &PublicKey,
) -> Vec<OwnedStealthAddress> {
    announcements
        .iter()
        .filter_map(|ann| scan_announcement(ann, viewing_sk, spending_pk).into_owned())
        .collect()
}

/// Derives the key pair controlling an owned stealth address.
///
/// # Errors
/// `StealthKeyMismatch` if the derived key does not control
/// `owned.stealth_address`.
pub fn recover_stealth_key_pair(
    spending_sk: &PrivateKey,
    viewing_sk: &PrivateKey,
    owned: &OwnedStealthAddress,
) -> Result<KeyPair> {
    let stealth_sk = derive_stealth_private_key(spending_sk, viewing_sk, &owned.ephemeral_public_key)?;
    let pair = key_pair_from_private_key(stealth_sk)?;

    if pair.address != owned.stealth_address {
        return Err(ShadowError::StealthKeyMismatch {
            derived: pair.address.to_checksum_string(),
            expected: owned.stealth_address.to_checksum_string(),
        });
    }

    Ok(pair)
}
