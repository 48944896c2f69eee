//! Common traits for SHADOW.
//!
//! These traits are the boundaries to everything outside the wallet core: the
//! on-chain name registry and announcer, the ledger that moves value, and
//! the storage slot holding the encrypted vault. Implementations might be
//! contract bindings, RPC clients or the in-memory versions used in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Announcement, BlockRange, EncryptedVault, EthAddress, KeyPair, StealthMetaAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// NAME REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Username → stealth meta-address resolver (ERC-6538 style).
#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Returns true if the username is registered.
    async fn username_exists(&self, name: &str) -> Result<bool>;

    /// Registers a username for `owner`.
    ///
    /// Fails with `UsernameTaken` if the name is already registered.
    async fn register_username(
        &self,
        owner: EthAddress,
        name: &str,
        meta: StealthMetaAddress,
    ) -> Result<()>;

    /// Resolves a username to its meta-address.
    ///
    /// `None` covers both unknown names and empty/zero records.
    async fn resolve_username(&self, name: &str) -> Result<Option<StealthMetaAddress>>;

    /// Reverse lookup: the username registered by `owner`.
    async fn username_of(&self, owner: EthAddress) -> Result<Option<String>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Append-only announcement log (ERC-5564 style).
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Publishes a new announcement.
    ///
    /// Returns the assigned announcement ID.
    async fn announce(&self, announcement: Announcement) -> Result<u64>;

    /// Retrieves announcements within a block range, in log order.
    async fn announcements(&self, range: BlockRange) -> Result<Vec<Announcement>>;

    /// Returns the latest block known to the announcer.
    async fn latest_block(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Balance lookup and value transfer, amounts in wei.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns the balance of `address`.
    async fn balance(&self, address: EthAddress) -> Result<u128>;

    /// Transfers `amount` from the signer's address to `to` and waits for
    /// the transfer to be accepted.
    ///
    /// Returns the transaction hash.
    async fn transfer(&self, signer: &KeyPair, to: EthAddress, amount: u128) -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage slot holding exactly one encrypted vault.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Stores the vault, replacing any previous one atomically.
    async fn save(&self, vault: &EncryptedVault) -> Result<()>;

    /// Loads the stored vault, if any.
    async fn load(&self) -> Result<Option<EncryptedVault>>;

    /// Removes the stored vault.
    async fn clear(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN PROGRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Progress update during scanning.
#[derive(Clone, Debug, Default)]
pub struct ScanProgress {
    /// Total announcements to scan
    pub total: u64,
    /// Announcements scanned so far
    pub scanned: u64,
    /// Announcements rejected by the view tag alone
    pub view_tag_filtered: u64,
    /// Discoveries found so far
    pub discoveries: u64,
}

impl ScanProgress {
    /// Completion in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.scanned as f64 / self.total as f64) * 100.0
    }
}

/// Callback for scan progress updates.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;
