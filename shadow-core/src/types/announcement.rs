//! Announcement types for the stealth payment log.
//!
//! Announcements mirror the ERC-5564 `Announcement` event. Senders publish one
//! per payment; recipients scan them to find payments addressed to them.

use serde::{Deserialize, Serialize};

use super::{EthAddress, PublicKey};
use crate::constants::SCHEME_ID_SECP256K1;
use crate::error::{Result, ShadowError};

/// An announcement published by the Announcer.
///
/// The ephemeral key and metadata are kept as raw bytes so that records
/// with a malformed shape can still be represented and skipped by scanners.
///
/// # JSON shape
/// ```text
/// { "scheme_id": 1, "stealth_address": "0x…", "ephemeral_public_key": "0x02…",
///   "metadata": "0x13", "block_number": 12, "transaction_hash": "0x…" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Position in the announcer's log (assigned by the announcer)
    #[serde(default)]
    pub id: u64,
    /// Scheme identifier; only `1` (secp256k1) is recognized
    pub scheme_id: u64,
    /// The stealth address funds were sent to
    pub stealth_address: EthAddress,
    /// Sender's ephemeral public key, compressed SEC1 for scheme 1
    #[serde(with = "prefixed_hex")]
    pub ephemeral_public_key: Vec<u8>,
    /// Scheme metadata; first byte is the view tag when present
    #[serde(default, with = "prefixed_hex")]
    pub metadata: Vec<u8>,
    /// Account that emitted the announcement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<EthAddress>,
    /// Block number if stored on-chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Transaction hash of the announcing transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl Announcement {
    /// Creates a scheme-1 announcement with empty metadata.
    pub fn new(stealth_address: EthAddress, ephemeral_public_key: Vec<u8>) -> Self {
        Self {
            id: 0, // Assigned by announcer
            scheme_id: SCHEME_ID_SECP256K1,
            stealth_address,
            ephemeral_public_key,
            metadata: Vec::new(),
            caller: None,
            block_number: None,
            transaction_hash: None,
        }
    }

    /// Creates a scheme-1 announcement whose metadata carries a view tag.
    pub fn with_view_tag(
        stealth_address: EthAddress,
        ephemeral_public_key: Vec<u8>,
        view_tag: u8,
    ) -> Self {
        let mut announcement = Self::new(stealth_address, ephemeral_public_key);
        announcement.metadata = vec![view_tag];
        announcement
    }

    /// Returns true for scheme 1.
    pub fn is_supported_scheme(&self) -> bool {
        self.scheme_id == SCHEME_ID_SECP256K1
    }

    /// View tag from the first metadata byte, if any.
    pub fn view_tag(&self) -> Option<u8> {
        self.metadata.first().copied()
    }

    /// Parses the ephemeral public key.
    ///
    /// # Errors
    /// `AnnouncementParseError` if the bytes are not a compressed SEC1 point encoding.
    pub fn ephemeral_key(&self) -> Result<PublicKey> {
        PublicKey::from_bytes(&self.ephemeral_public_key).map_err(|e| {
            ShadowError::AnnouncementParseError(format!("ephemeral public key: {e}"))
        })
    }

    /// Validates the announcement structure.
    pub fn validate(&self) -> Result<()> {
        if !self.is_supported_scheme() {
            return Err(ShadowError::AnnouncementParseError(format!(
                "unsupported scheme id {}",
                self.scheme_id
            )));
        }

        if self.stealth_address.is_zero() {
            return Err(ShadowError::AnnouncementParseError(
                "stealth address is zero".into(),
            ));
        }

        self.ephemeral_key()?;
        Ok(())
    }
}

/// Builder for creating announcements with optional fields.
#[derive(Default)]
pub struct AnnouncementBuilder {
    scheme_id: Option<u64>,
    stealth_address: Option<EthAddress>,
    ephemeral_public_key: Option<Vec<u8>>,
    metadata: Vec<u8>,
    caller: Option<EthAddress>,
    block_number: Option<u64>,
    transaction_hash: Option<String>,
}

impl AnnouncementBuilder {
    /// Creates a new announcement builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the scheme id (defaults to 1).
    pub fn scheme_id(mut self, scheme_id: u64) -> Self {
        self.scheme_id = Some(scheme_id);
        self
    }

    /// Sets the stealth address (required).
    pub fn stealth_address(mut self, address: EthAddress) -> Self {
        self.stealth_address = Some(address);
        self
    }

    /// Sets the ephemeral public key (required).
    pub fn ephemeral_public_key(mut self, key: Vec<u8>) -> Self {
        self.ephemeral_public_key = Some(key);
        self
    }

    /// Sets the raw metadata.
    pub fn metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the view tag as the first metadata byte.
    pub fn view_tag(mut self, tag: u8) -> Self {
        if self.metadata.is_empty() {
            self.metadata.push(tag);
        } else {
            self.metadata[0] = tag;
        }
        self
    }

    /// Sets the caller (optional).
    pub fn caller(mut self, caller: EthAddress) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Sets the block number (optional).
    pub fn block_number(mut self, num: u64) -> Self {
        self.block_number = Some(num);
        self
    }

    /// Sets the transaction hash (optional).
    pub fn transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    /// Builds the announcement.
    ///
    /// Only required fields are checked; scanners decide what to do with
    /// unsupported schemes or malformed keys.
    pub fn build(self) -> Result<Announcement> {
        let stealth_address = self
            .stealth_address
            .ok_or_else(|| ShadowError::ValidationError("stealth_address is required".into()))?;

        let ephemeral_public_key = self.ephemeral_public_key.ok_or_else(|| {
            ShadowError::ValidationError("ephemeral_public_key is required".into())
        })?;

        let mut announcement = Announcement::new(stealth_address, ephemeral_public_key);
        if let Some(scheme_id) = self.scheme_id {
            announcement.scheme_id = scheme_id;
        }
        announcement.metadata = self.metadata;
        announcement.caller = self.caller;
        announcement.block_number = self.block_number;
        announcement.transaction_hash = self.transaction_hash;

        Ok(announcement)
    }
}

/// Inclusive block range for announcement queries.
///
/// Announcements without a block number have not been mined into a block
/// yet and match every range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block (inclusive); `None` means from genesis
    pub from_block: Option<u64>,
    /// Last block (inclusive); `None` means up to the latest block
    pub to_block: Option<u64>,
}

impl BlockRange {
    /// The whole log.
    pub fn all() -> Self {
        Self::default()
    }

    /// Blocks `from..=to`.
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block: Some(from_block),
            to_block: Some(to_block),
        }
    }

    /// Everything from `from_block` onward.
    pub fn since(from_block: u64) -> Self {
        Self {
            from_block: Some(from_block),
            to_block: None,
        }
    }

    /// Returns true if the announcement falls inside the range.
    pub fn contains(&self, announcement: &Announcement) -> bool {
        let Some(block) = announcement.block_number else {
            return true;
        };
        self.from_block.map_or(true, |from| block >= from)
            && self.to_block.map_or(true, |to| block <= to)
    }
}

/// A stealth address found by scanning, with the record that revealed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedStealthAddress {
    /// The stealth address this wallet controls
    pub stealth_address: EthAddress,
    /// Ephemeral key needed to derive the stealth private key
    pub ephemeral_public_key: PublicKey,
    /// The announcement the address was recovered from
    pub announcement: Announcement,
}

/// Statistics about announcements in a log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnouncementStats {
    /// Total number of announcements
    pub total_count: u64,
    /// Announcements with scheme id 1
    pub supported_scheme_count: u64,
    /// Announcements carrying a view tag
    pub view_tagged_count: u64,
    /// Announcements per view tag (for distribution analysis)
    pub view_tag_distribution: Vec<u64>,
    /// Earliest block seen
    pub earliest_block: Option<u64>,
    /// Latest block seen
    pub latest_block: Option<u64>,
}

impl Default for AnnouncementStats {
    fn default() -> Self {
        Self {
            total_count: 0,
            supported_scheme_count: 0,
            view_tagged_count: 0,
            view_tag_distribution: vec![0; 256],
            earliest_block: None,
            latest_block: None,
        }
    }
}

impl AnnouncementStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates stats with a new announcement.
    pub fn add(&mut self, announcement: &Announcement) {
        self.total_count += 1;
        if announcement.is_supported_scheme() {
            self.supported_scheme_count += 1;
        }
        if let Some(tag) = announcement.view_tag() {
            self.view_tagged_count += 1;
            self.view_tag_distribution[tag as usize] += 1;
        }

        if let Some(block) = announcement.block_number {
            self.earliest_block = Some(self.earliest_block.map_or(block, |b| b.min(block)));
            self.latest_block = Some(self.latest_block.map_or(block, |b| b.max(block)));
        }
    }
}

/// Serde helper for `0x`-prefixed hex byte strings; the prefix is optional on input.
mod prefixed_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const EPHEMERAL: &str = "031b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f";

    fn stealth() -> EthAddress {
        EthAddress::from_hex("0xc95659c38c4a3c90c3cbec303f056c11ee717104").unwrap()
    }

    fn ephemeral() -> Vec<u8> {
        hex::decode(EPHEMERAL).unwrap()
    }

    #[test]
    fn test_announcement_creation() {
        let ann = Announcement::new(stealth(), ephemeral());
        assert_eq!(ann.scheme_id, 1);
        assert!(ann.metadata.is_empty());
        assert_eq!(ann.view_tag(), None);
        assert!(ann.validate().is_ok());
    }

    #[test]
    fn test_announcement_view_tag() {
        let ann = Announcement::with_view_tag(stealth(), ephemeral(), 19);
        assert_eq!(ann.view_tag(), Some(19));
        assert_eq!(ann.metadata, vec![19]);
    }

    #[test]
    fn test_announcement_validation() {
        let valid = Announcement::new(stealth(), ephemeral());

        let mut wrong_scheme = valid.clone();
        wrong_scheme.scheme_id = 2;
        assert!(matches!(
            wrong_scheme.validate(),
            Err(ShadowError::AnnouncementParseError(_))
        ));

        let mut bad_key = valid.clone();
        bad_key.ephemeral_public_key = vec![0x04; 65];
        assert!(matches!(
            bad_key.validate(),
            Err(ShadowError::AnnouncementParseError(_))
        ));

        let mut zero_addr = valid;
        zero_addr.stealth_address = EthAddress::zero();
        assert!(zero_addr.validate().is_err());
    }

    #[test]
    fn test_announcement_json_shape() {
        let ann = AnnouncementBuilder::new()
            .stealth_address(stealth())
            .ephemeral_public_key(ephemeral())
            .view_tag(0x13)
            .block_number(42)
            .transaction_hash("0xabc")
            .build()
            .unwrap();

        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["scheme_id"], 1);
        assert_eq!(json["ephemeral_public_key"], format!("0x{EPHEMERAL}"));
        assert_eq!(json["metadata"], "0x13");
        assert_eq!(json["stealth_address"], "0xC95659C38C4A3C90c3cBEc303F056C11ee717104");

        let back: Announcement = serde_json::from_value(json).unwrap();
        assert_eq!(back, ann);
    }

    #[test]
    fn test_announcement_json_defaults() {
        let json = format!(
            r#"{{"scheme_id":1,"stealth_address":"0xc95659c38c4a3c90c3cbec303f056c11ee717104","ephemeral_public_key":"{EPHEMERAL}"}}"#
        );
        let ann: Announcement = serde_json::from_str(&json).unwrap();
        assert!(ann.metadata.is_empty());
        assert_eq!(ann.id, 0);
        assert_eq!(ann.ephemeral_public_key, ephemeral());
    }

    #[test]
    fn test_announcement_builder_missing_required() {
        let result = AnnouncementBuilder::new().ephemeral_public_key(ephemeral()).build();
        assert!(result.is_err());

        let result = AnnouncementBuilder::new().stealth_address(stealth()).build();
        assert!(result.is_err());
    }

    #[test_case(BlockRange::all(), Some(5), true ; "unbounded")]
    #[test_case(BlockRange::new(10, 20), Some(10), true ; "lower bound inclusive")]
    #[test_case(BlockRange::new(10, 20), Some(20), true ; "upper bound inclusive")]
    #[test_case(BlockRange::new(10, 20), Some(21), false ; "past end")]
    #[test_case(BlockRange::since(10), Some(9), false ; "before start")]
    #[test_case(BlockRange::new(10, 20), None, true ; "pending")]
    fn test_block_range(range: BlockRange, block: Option<u64>, expected: bool) {
        let mut ann = Announcement::new(stealth(), ephemeral());
        ann.block_number = block;
        assert_eq!(range.contains(&ann), expected);
    }

    #[test]
    fn test_announcement_stats() {
        let mut stats = AnnouncementStats::new();

        let mut a = Announcement::with_view_tag(stealth(), ephemeral(), 0x42);
        a.block_number = Some(7);
        let mut b = Announcement::with_view_tag(stealth(), ephemeral(), 0x42);
        b.block_number = Some(3);
        let mut c = Announcement::new(stealth(), ephemeral());
        c.scheme_id = 9;

        stats.add(&a);
        stats.add(&b);
        stats.add(&c);

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.supported_scheme_count, 2);
        assert_eq!(stats.view_tagged_count, 2);
        assert_eq!(stats.view_tag_distribution[0x42], 2);
        assert_eq!(stats.earliest_block, Some(3));
        assert_eq!(stats.latest_block, Some(7));
    }
}
