//! File-backed announcer and vault store.
//!
//! Both store pretty-printed JSON and replace the file atomically on every
//! write (write to a temp file, sync, then rename).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::{Announcer, VaultStore};
use shadow_core::types::{Announcement, AnnouncementStats, BlockRange, EncryptedVault};

use crate::MemoryRegistry;

/// Writes `contents` to `path` via a temp file and rename.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Announcement log persisted as a JSON array.
///
/// Uses a memory registry internally; the whole log is rewritten after each
/// announcement, so a returned ID is always durable. An announcement whose
/// write fails is taken back out of the log.
///
/// Records that cannot be read are skipped with a warning and written back
/// untouched, after the readable ones.
pub struct FileAnnouncer {
    /// Path to the log file
    path: PathBuf,
    /// In-memory log
    memory: MemoryRegistry,
    /// Records that failed to deserialize on open
    unreadable: Vec<serde_json::Value>,
    /// Serializes announce-then-save
    write_lock: tokio::sync::Mutex<()>,
}

impl FileAnnouncer {
    /// Opens the log at `path`, loading it if the file exists.
    ///
    /// The file is not created until the first announcement.
    #[instrument]
    pub async fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let memory = MemoryRegistry::new();
        let mut unreadable = Vec::new();

        if fs::try_exists(&path).await? {
            let contents = fs::read(&path).await?;
            let records: Vec<serde_json::Value> = serde_json::from_slice(&contents)
                .map_err(|e| ShadowError::AnnouncerError(format!("corrupt announcement log: {e}")))?;

            let mut announcements = Vec::with_capacity(records.len());
            for (index, record) in records.into_iter().enumerate() {
                match serde_json::from_value::<Announcement>(record.clone()) {
                    Ok(announcement) => announcements.push(announcement),
                    Err(e) => {
                        warn!(index, error = %e, "Skipping unreadable announcement record");
                        unreadable.push(record);
                    }
                }
            }

            let count = memory.import(announcements)?;
            info!(count, skipped = unreadable.len(), "Loaded announcement log");
        }

        Ok(Self {
            path,
            memory,
            unreadable,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Saves the log to disk.
    async fn save(&self) -> Result<()> {
        let mut records = self
            .memory
            .all_announcements()
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        records.extend(self.unreadable.iter().cloned());

        let serialized = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path, &serialized).await?;
        debug!(path = ?self.path, "Announcement log saved");
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.memory.stats()
    }

    /// Returns the number of announcements.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[async_trait]
impl Announcer for FileAnnouncer {
    async fn announce(&self, announcement: Announcement) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let id = self.memory.announce(announcement).await?;
        if let Err(e) = self.save().await {
            self.memory.retract(id);
            return Err(e);
        }
        Ok(id)
    }

    async fn announcements(&self, range: BlockRange) -> Result<Vec<Announcement>> {
        self.memory.announcements(range).await
    }

    async fn latest_block(&self) -> Result<u64> {
        self.memory.latest_block().await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT FILE
// ═══════════════════════════════════════════════════════════════════════════════

/// Vault stored as a JSON file.
///
/// ```text
/// { "ciphertext": "…", "salt": "…", "iv": "…" }   (lowercase hex)
/// ```
#[derive(Debug, Clone)]
pub struct FileVaultStore {
    path: PathBuf,
}

impl FileVaultStore {
    /// Creates a store for `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VaultStore for FileVaultStore {
    #[instrument(skip(self, vault), fields(path = ?self.path))]
    async fn save(&self, vault: &EncryptedVault) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(vault)?;
        write_atomic(&self.path, &serialized).await?;
        info!("Vault saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<EncryptedVault>> {
        match fs::read(&self.path).await {
            Ok(contents) => Ok(Some(serde_json::from_slice(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
