//! In-memory registry, announcer and vault store.
//!
//! Fast, thread-safe implementations suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::{Announcer, NameRegistry, VaultStore};
use shadow_core::types::{
    Announcement, AnnouncementStats, BlockRange, EncryptedVault, EthAddress, StealthMetaAddress,
};

/// A username record.
#[derive(Clone, Copy, Debug)]
struct NameRecord {
    owner: EthAddress,
    meta_address: StealthMetaAddress,
}

/// In-memory name registry and announcement log.
///
/// Announcements form an append-only log in publication order. Records are
/// stored as published, malformed or not; scanners decide what to skip.
///
/// # Indexing
///
/// - Username: forward lookup to owner and meta-address
/// - Owner: reverse lookup to username
/// - Tx hash: duplicate detection (when provided)
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// Username → record
    names: DashMap<String, NameRecord>,
    /// Owner → username
    owners: DashMap<EthAddress, String>,
    /// The announcement log, in publication order
    log: RwLock<Vec<Announcement>>,
    /// Normalized tx hash → announcement ID
    tx_hash_index: DashMap<String, u64>,
    /// Next announcement ID
    next_id: AtomicU64,
    /// Block stamped on announcements that arrive without one
    current_block: AtomicU64,
    /// Log statistics
    stats: RwLock<AnnouncementStats>,
}

impl MemoryRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            names: DashMap::new(),
            owners: DashMap::new(),
            log: RwLock::new(Vec::new()),
            tx_hash_index: DashMap::new(),
            next_id: AtomicU64::new(1),
            current_block: AtomicU64::new(0),
            stats: RwLock::new(AnnouncementStats::new()),
        }
    }

    /// Normalizes a tx hash for indexing (lowercase, trimmed).
    fn normalize_tx_hash(hash: &str) -> String {
        hash.trim().to_lowercase()
    }

    /// Moves to the next block and returns its number.
    pub fn advance_block(&self) -> u64 {
        self.current_block.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.stats.read().clone()
    }

    /// Returns the number of announcements.
    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    /// Returns the whole log (for export/backup).
    pub fn all_announcements(&self) -> Vec<Announcement> {
        self.log.read().clone()
    }

    /// Removes the latest announcement if its ID is `id`.
    ///
    /// Undoes an `announce` whose result could not be persisted, so that a
    /// retry gets the same ID and passes duplicate detection.
    pub(crate) fn retract(&self, id: u64) -> Option<Announcement> {
        let mut log = self.log.write();
        if log.last().map(|ann| ann.id) != Some(id) {
            return None;
        }
        let ann = log.pop()?;

        if let Some(ref hash) = ann.transaction_hash {
            self.tx_hash_index.remove(&Self::normalize_tx_hash(hash));
        }
        let _ = self
            .next_id
            .compare_exchange(id.saturating_add(1), id, Ordering::SeqCst, Ordering::SeqCst);

        let mut stats = AnnouncementStats::new();
        for remaining in log.iter() {
            stats.add(remaining);
        }
        *self.stats.write() = stats;

        debug!(id, "Announcement retracted");
        Some(ann)
    }

    /// Appends previously exported announcements, keeping their IDs and blocks.
    ///
    /// Announcements with ID 0 get a fresh one.
    pub fn import(&self, announcements: Vec<Announcement>) -> Result<usize> {
        let mut log = self.log.write();
        let mut stats = self.stats.write();
        let mut imported = 0;

        for mut ann in announcements {
            if ann.id == 0 {
                ann.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            } else {
                self.next_id.fetch_max(ann.id + 1, Ordering::SeqCst);
            }

            if let Some(block) = ann.block_number {
                self.current_block.fetch_max(block, Ordering::SeqCst);
            }

            if let Some(ref hash) = ann.transaction_hash {
                self.tx_hash_index.insert(Self::normalize_tx_hash(hash), ann.id);
            }

            stats.add(&ann);
            log.push(ann);
            imported += 1;
        }

        Ok(imported)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameRegistry for MemoryRegistry {
    async fn username_exists(&self, name: &str) -> Result<bool> {
        Ok(self.names.contains_key(name))
    }

    #[instrument(skip(self, meta))]
    async fn register_username(
        &self,
        owner: EthAddress,
        name: &str,
        meta: StealthMetaAddress,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(ShadowError::ValidationError("username is empty".into()));
        }

        // One name per owner keeps the reverse lookup unambiguous
        if let Some(existing) = self.owners.get(&owner) {
            return Err(ShadowError::RegistryError(format!(
                "{owner} is already registered as {}",
                existing.value()
            )));
        }

        match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(ShadowError::UsernameTaken(name.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(NameRecord {
                    owner,
                    meta_address: meta,
                });
            }
        }

        self.owners.insert(owner, name.to_string());
        debug!(name, "Username registered");
        Ok(())
    }

    async fn resolve_username(&self, name: &str) -> Result<Option<StealthMetaAddress>> {
        Ok(self.names.get(name).map(|record| record.meta_address))
    }

    async fn username_of(&self, owner: EthAddress) -> Result<Option<String>> {
        Ok(self.owners.get(&owner).map(|name| name.clone()))
    }
}

#[async_trait]
impl Announcer for MemoryRegistry {
    /// Appends an announcement to the log.
    ///
    /// The announcement is assigned an ID and, if it has none, the current
    /// block number.
    #[instrument(skip(self, announcement), fields(stealth_address = %announcement.stealth_address))]
    async fn announce(&self, mut announcement: Announcement) -> Result<u64> {
        // Reject duplicate tx hash if provided
        let normalized = match announcement.transaction_hash {
            Some(ref hash) => {
                let normalized = Self::normalize_tx_hash(hash);
                if normalized.is_empty() {
                    return Err(ShadowError::AnnouncerError(
                        "transaction hash cannot be empty".into(),
                    ));
                }
                Some(normalized)
            }
            None => None,
        };

        let mut log = self.log.write();

        if let Some(ref hash) = normalized {
            if self.tx_hash_index.contains_key(hash) {
                return Err(ShadowError::DuplicateAnnouncement(hash.clone()));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        announcement.id = id;
        if announcement.block_number.is_none() {
            announcement.block_number = Some(self.current_block.load(Ordering::SeqCst));
        }

        if let Some(hash) = normalized {
            self.tx_hash_index.insert(hash, id);
        }

        debug!(id, block = ?announcement.block_number, "Announcement published");

        self.stats.write().add(&announcement);
        log.push(announcement);

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn announcements(&self, range: BlockRange) -> Result<Vec<Announcement>> {
        let matching: Vec<Announcement> = self
            .log
            .read()
            .iter()
            .filter(|ann| range.contains(ann))
            .cloned()
            .collect();

        debug!(count = matching.len(), "Retrieved announcements");
        Ok(matching)
    }

    async fn latest_block(&self) -> Result<u64> {
        Ok(self.current_block.load(Ordering::SeqCst))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory vault slot.
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    vault: RwLock<Option<EncryptedVault>>,
}

impl MemoryVaultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for MemoryVaultStore {
    async fn save(&self, vault: &EncryptedVault) -> Result<()> {
        *self.vault.write() = Some(vault.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<EncryptedVault>> {
        Ok(self.vault.read().clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.vault.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_core::types::{AnnouncementBuilder, PublicKey};

    const SPENDING: &str = "0376bf533d4b15510fa9f4124b6e48616f07debcf2ef0cfb185cdc4a576450b475";
    const VIEWING: &str = "02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d";

    fn meta() -> StealthMetaAddress {
        StealthMetaAddress::new(
            PublicKey::from_hex(SPENDING).unwrap(),
            PublicKey::from_hex(VIEWING).unwrap(),
        )
    }

    fn make_test_announcement(tag: u8) -> Announcement {
        Announcement::with_view_tag(EthAddress::from_array([tag; 20]), vec![0x02; 33], tag)
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let registry = MemoryRegistry::new();
        let owner = EthAddress::from_array([0x11; 20]);

        assert!(!registry.username_exists("alice").await.unwrap());
        registry.register_username(owner, "alice", meta()).await.unwrap();

        assert!(registry.username_exists("alice").await.unwrap());
        assert_eq!(registry.resolve_username("alice").await.unwrap(), Some(meta()));
        assert_eq!(registry.username_of(owner).await.unwrap().as_deref(), Some("alice"));
        assert_eq!(registry.resolve_username("bob").await.unwrap(), None);
        assert_eq!(registry.username_of(EthAddress::zero()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_username_taken() {
        let registry = MemoryRegistry::new();
        registry
            .register_username(EthAddress::from_array([0x11; 20]), "alice", meta())
            .await
            .unwrap();

        let result = registry
            .register_username(EthAddress::from_array([0x22; 20]), "alice", meta())
            .await;
        assert!(matches!(result, Err(ShadowError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn test_one_username_per_owner() {
        let registry = MemoryRegistry::new();
        let owner = EthAddress::from_array([0x11; 20]);
        registry.register_username(owner, "alice", meta()).await.unwrap();

        let result = registry.register_username(owner, "alice2", meta()).await;
        assert!(matches!(result, Err(ShadowError::RegistryError(_))));
        assert!(!registry.username_exists("alice2").await.unwrap());
        assert_eq!(registry.username_of(owner).await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_announce_assigns_ids_in_order() {
        let registry = MemoryRegistry::new();

        let a = registry.announce(make_test_announcement(1)).await.unwrap();
        let b = registry.announce(make_test_announcement(2)).await.unwrap();
        assert_eq!((a, b), (1, 2));

        let log = registry.announcements(BlockRange::all()).await.unwrap();
        let tags: Vec<Option<u8>> = log.iter().map(|ann| ann.view_tag()).collect();
        assert_eq!(tags, vec![Some(1), Some(2)]);
        assert_eq!(log[0].id, 1);
    }

    #[tokio::test]
    async fn test_block_range_queries() {
        let registry = MemoryRegistry::new();

        registry.announce(make_test_announcement(1)).await.unwrap(); // block 0
        registry.advance_block();
        registry.announce(make_test_announcement(2)).await.unwrap(); // block 1
        assert_eq!(registry.advance_block(), 2);
        registry.announce(make_test_announcement(3)).await.unwrap(); // block 2

        assert_eq!(registry.latest_block().await.unwrap(), 2);
        assert_eq!(registry.announcements(BlockRange::new(1, 1)).await.unwrap().len(), 1);
        assert_eq!(registry.announcements(BlockRange::since(1)).await.unwrap().len(), 2);
        assert_eq!(registry.announcements(BlockRange::new(5, 9)).await.unwrap().len(), 0);

        // Explicit block numbers are kept
        let explicit = AnnouncementBuilder::new()
            .stealth_address(EthAddress::from_array([9; 20]))
            .ephemeral_public_key(vec![0x03; 33])
            .block_number(100)
            .build()
            .unwrap();
        registry.announce(explicit).await.unwrap();
        assert_eq!(registry.announcements(BlockRange::since(50)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_announcements_are_stored() {
        let registry = MemoryRegistry::new();
        let mut ann = make_test_announcement(1);
        ann.ephemeral_public_key = vec![0xFF; 3];
        ann.scheme_id = 9;

        registry.announce(ann).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().supported_scheme_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_tx_hash_rejected() {
        let registry = MemoryRegistry::new();

        let mut first = make_test_announcement(1);
        first.transaction_hash = Some("0xABC".into());
        registry.announce(first).await.unwrap();

        let mut second = make_test_announcement(2);
        second.transaction_hash = Some("  0xabc ".into());
        assert!(matches!(
            registry.announce(second).await,
            Err(ShadowError::DuplicateAnnouncement(_))
        ));

        let mut empty = make_test_announcement(3);
        empty.transaction_hash = Some("   ".into());
        assert!(registry.announce(empty).await.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = MemoryRegistry::new();

        registry.announce(make_test_announcement(0x42)).await.unwrap();
        registry.announce(make_test_announcement(0x42)).await.unwrap();
        registry.announce(make_test_announcement(0x00)).await.unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.view_tag_distribution[0x42], 2);
        assert_eq!(stats.view_tag_distribution[0x00], 1);
    }

    #[tokio::test]
    async fn test_import_export() {
        let registry1 = MemoryRegistry::new();
        registry1.announce(make_test_announcement(0x01)).await.unwrap();
        registry1.advance_block();
        registry1.announce(make_test_announcement(0x02)).await.unwrap();

        let announcements = registry1.all_announcements();
        let registry2 = MemoryRegistry::new();
        assert_eq!(registry2.import(announcements).unwrap(), 2);
        assert_eq!(registry2.len(), 2);
        assert_eq!(registry2.latest_block().await.unwrap(), 1);

        // IDs continue after the imported ones
        let id = registry2.announce(make_test_announcement(0x03)).await.unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn test_concurrent_announce() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u8 {
            let reg = registry.clone();
            tasks.spawn(async move { reg.announce(make_test_announcement(i)).await.unwrap() });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(registry.len(), 100);
        let mut ids: Vec<u64> = registry.all_announcements().iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn test_memory_vault_store() {
        let store = MemoryVaultStore::new();
        assert!(store.load().await.unwrap().is_none());

        let vault = EncryptedVault {
            ciphertext: vec![1; 32],
            salt: [2; 16],
            iv: [3; 16],
        };
        store.save(&vault).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(vault));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
