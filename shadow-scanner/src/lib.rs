//! # SHADOW Scanner
//!
//! Batch scanning of the announcement log to discover incoming payments.
//!
//! ## Features
//!
//! - **Lazy Scanning**: Order-preserving iterator over owned stealth addresses
//! - **Parallel Scanning**: Batches fan out over tokio's blocking pool, merged in input order
//! - **Progress Reporting**: Callbacks for UI progress updates
//! - **Resumable Scans**: Track the last scanned block to resume later
//!
//! Only the viewing private key and the spending public key are needed, so a
//! watch-only export can scan but never spend.
//!
//! ## Example
//!
//! ```rust
//! use shadow_registry::MemoryRegistry;
//! use shadow_scanner::{Scanner, ScannerConfig};
//! use shadow_core::{Announcer, BlockRange};
//! use shadow_stealth::{create_stealth_payment, ShadowWallet};
//!
//! # tokio_test::block_on(async {
//! let wallet = ShadowWallet::from_mnemonic(
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//! ).unwrap();
//! let registry = MemoryRegistry::new();
//! let payment = create_stealth_payment(wallet.meta_address()).unwrap();
//! registry.announce(payment.announcement).await.unwrap();
//!
//! let scanner = Scanner::from_wallet(&wallet, ScannerConfig::default());
//! let owned = scanner.scan_from(&registry, BlockRange::all()).await.unwrap();
//! assert_eq!(owned[0].stealth_address, payment.stealth_address);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use zeroize::ZeroizeOnDrop;

use shadow_core::constants::{DEFAULT_SCAN_BATCH_SIZE, DEFAULT_SCAN_WORKERS, MAX_SCAN_BATCH_SIZE};
use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::{Announcer, Ledger, ProgressCallback, ScanProgress};
use shadow_core::types::{Announcement, BlockRange, EthAddress, OwnedStealthAddress, PrivateKey, PublicKey};
use shadow_stealth::discovery::{scan_announcement, ScanResult, ScanStats};
use shadow_stealth::{ShadowWallet, ViewingKeyExport};

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Announcements per batch (and per progress update)
    pub batch_size: usize,
    /// Maximum batches in flight during a parallel scan
    pub workers: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            workers: DEFAULT_SCAN_WORKERS,
        }
    }
}

impl ScannerConfig {
    /// Creates default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets batch size, clamped to `1..=MAX_SCAN_BATCH_SIZE`.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_SCAN_BATCH_SIZE);
        self
    }

    /// Sets the number of concurrent batches (at least 1).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Scan position for resumable scanning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPosition {
    /// Last scanned announcement ID
    pub last_id: u64,
    /// Highest block number seen
    pub last_block: Option<u64>,
    /// Total announcements scanned in this session
    pub total_scanned: u64,
    /// Total discoveries in this session
    pub total_discoveries: u64,
}

impl ScanPosition {
    /// Creates a new scan position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates position after scanning an announcement.
    pub fn update(&mut self, announcement: &Announcement, discovered: bool) {
        self.last_id = announcement.id;
        if let Some(block) = announcement.block_number {
            self.last_block = Some(self.last_block.map_or(block, |b| b.max(block)));
        }
        self.total_scanned += 1;
        if discovered {
            self.total_discoveries += 1;
        }
    }

    /// Range covering everything after the last scanned block.
    pub fn next_range(&self) -> BlockRange {
        match self.last_block {
            Some(block) => BlockRange::since(block.saturating_add(1)),
            None => BlockRange::all(),
        }
    }
}

/// A discovered stealth address holding funds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundedStealthAddress {
    /// The owned address and the announcement that revealed it
    pub owned: OwnedStealthAddress,
    /// Current balance in wei
    pub balance: u128,
}

/// Keys held for the scanner's lifetime; zeroized when the last holder drops.
#[derive(ZeroizeOnDrop)]
struct ScanKeys {
    viewing_sk: PrivateKey,
    #[zeroize(skip)]
    spending_pk: PublicKey,
}

/// Classifies one announcement and logs the per-record decision.
fn scan_record(keys: &ScanKeys, announcement: &Announcement) -> ScanResult {
    let result = scan_announcement(announcement, &keys.viewing_sk, &keys.spending_pk);
    match &result {
        ScanResult::UnsupportedScheme(scheme_id) => {
            debug!(id = announcement.id, scheme_id, "Skipping unsupported scheme");
        }
        ScanResult::Failed(e) => {
            warn!(id = announcement.id, error = %e, "Skipping malformed announcement");
        }
        ScanResult::Discovered(owned) => {
            debug!(id = announcement.id, stealth_address = %owned.stealth_address, "Discovered payment");
        }
        ScanResult::ViewTagMismatch | ScanResult::NotForUs => {}
    }
    result
}

/// Scans one batch on the current thread.
fn scan_batch(keys: &ScanKeys, batch: &[Announcement]) -> (Vec<OwnedStealthAddress>, ScanStats, ScanPosition) {
    let mut owned = Vec::new();
    let mut stats = ScanStats::new();
    let mut position = ScanPosition::new();

    for announcement in batch {
        let result = scan_record(keys, announcement);
        stats.record(&result);
        position.update(announcement, result.is_discovered());
        if let Some(found) = result.into_owned() {
            owned.push(found);
        }
    }

    (owned, stats, position)
}

/// Main scanner for discovering payments.
pub struct Scanner {
    keys: Arc<ScanKeys>,
    config: ScannerConfig,
    /// Current scan position
    position: RwLock<ScanPosition>,
    /// Scan statistics
    stats: RwLock<ScanStats>,
}

impl Scanner {
    /// Creates a scanner from the viewing private key and spending public key.
    pub fn new(viewing_sk: PrivateKey, spending_pk: PublicKey, config: ScannerConfig) -> Self {
        Self {
            keys: Arc::new(ScanKeys {
                viewing_sk,
                spending_pk,
            }),
            config,
            position: RwLock::new(ScanPosition::new()),
            stats: RwLock::new(ScanStats::new()),
        }
    }

    /// Creates a scanner from an unlocked wallet.
    pub fn from_wallet(wallet: &ShadowWallet, config: ScannerConfig) -> Self {
        Self::new(
            wallet.viewing().private_key.clone(),
            wallet.spending().public_key,
            config,
        )
    }

    /// Creates a watch-only scanner from exported viewing keys.
    pub fn from_viewing_export(export: &ViewingKeyExport, config: ScannerConfig) -> Result<Self> {
        let (viewing_sk, spending_pk) = export.keys()?;
        Ok(Self::new(viewing_sk, spending_pk, config))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Returns the current scan position.
    pub fn position(&self) -> ScanPosition {
        self.position.read().clone()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Summary of everything scanned since creation or the last reset.
    pub fn summary(&self) -> ScanSummary {
        self.stats().into()
    }

    /// Resets position and statistics.
    pub fn reset(&self) {
        *self.position.write() = ScanPosition::new();
        *self.stats.write() = ScanStats::new();
    }

    /// Scans a single announcement.
    pub fn scan_one(&self, announcement: &Announcement) -> ScanResult {
        let result = scan_record(&self.keys, announcement);
        self.stats.write().record(&result);
        self.position.write().update(announcement, result.is_discovered());
        result
    }

    /// Lazily yields owned stealth addresses in input order.
    ///
    /// Nothing is scanned until the iterator is polled; calling this again
    /// on the same input starts over.
    pub fn scan_iter<'a, I>(&'a self, announcements: I) -> impl Iterator<Item = OwnedStealthAddress> + 'a
    where
        I: IntoIterator<Item = &'a Announcement>,
        I::IntoIter: 'a,
    {
        announcements
            .into_iter()
            .filter_map(move |announcement| self.scan_one(announcement).into_owned())
    }

    /// Scans in parallel.
    ///
    /// Announcements are split into batches of `config.batch_size`; at most
    /// `config.workers` batches run at once on the blocking pool. The output
    /// order matches the input order.
    #[instrument(skip(self, announcements), fields(count = announcements.len()))]
    pub async fn scan(&self, announcements: &[Announcement]) -> Result<Vec<OwnedStealthAddress>> {
        self.scan_batches(announcements, None).await
    }

    /// Scans in parallel like [`Scanner::scan`], reporting progress each time
    /// the next batch in input order completes.
    ///
    /// An empty input reports once, with nothing scanned.
    #[instrument(skip(self, announcements, progress_callback), fields(count = announcements.len()))]
    pub async fn scan_with_batch_progress(
        &self,
        announcements: &[Announcement],
        progress_callback: ProgressCallback,
    ) -> Result<Vec<OwnedStealthAddress>> {
        self.scan_batches(announcements, Some(&progress_callback)).await
    }

    async fn scan_batches(
        &self,
        announcements: &[Announcement],
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<Vec<OwnedStealthAddress>> {
        let start = Instant::now();
        let batches: Vec<Vec<Announcement>> = announcements
            .chunks(self.config.batch_size.max(1))
            .map(<[Announcement]>::to_vec)
            .collect();

        debug!(batches = batches.len(), workers = self.config.workers, "Starting parallel scan");

        let mut results = stream::iter(batches.into_iter().map(|batch| {
            let keys = Arc::clone(&self.keys);
            tokio::task::spawn_blocking(move || scan_batch(&keys, &batch))
        }))
        .buffered(self.config.workers.max(1));

        let mut owned = Vec::new();
        let mut session = ScanStats::new();
        let mut progress = ScanProgress {
            total: announcements.len() as u64,
            ..ScanProgress::default()
        };

        while let Some(result) = results.next().await {
            let (found, stats, position) =
                result.map_err(|e| ShadowError::InternalError(format!("scan task failed: {e}")))?;
            owned.extend(found);
            session.merge(&stats);
            self.merge_position(&position);

            if let Some(callback) = progress_callback {
                progress.scanned = session.total_scanned;
                progress.view_tag_filtered = session.view_tag_filtered;
                progress.discoveries = session.discoveries;
                callback(progress.clone());
            }
        }

        if announcements.is_empty() {
            if let Some(callback) = progress_callback {
                callback(progress);
            }
        }

        session.duration_ms = start.elapsed().as_millis() as u64;
        self.finish(&session);
        Ok(owned)
    }

    /// Fetches a block range from the announcer, then scans it in parallel.
    ///
    /// # Errors
    /// Fetch errors propagate; per-record problems never do.
    #[instrument(skip(self, announcer))]
    pub async fn scan_from(
        &self,
        announcer: &dyn Announcer,
        range: BlockRange,
    ) -> Result<Vec<OwnedStealthAddress>> {
        let announcements = announcer.announcements(range).await?;
        self.scan(&announcements).await
    }

    /// Scans sequentially, reporting progress after every batch and once at the end.
    pub fn scan_with_progress(
        &self,
        announcements: &[Announcement],
        progress_callback: ProgressCallback,
    ) -> Vec<OwnedStealthAddress> {
        let start = Instant::now();
        let mut owned = Vec::new();
        let mut session = ScanStats::new();
        let mut progress = ScanProgress {
            total: announcements.len() as u64,
            ..ScanProgress::default()
        };

        for (index, announcement) in announcements.iter().enumerate() {
            let result = scan_record(&self.keys, announcement);
            session.record(&result);
            self.position.write().update(announcement, result.is_discovered());
            if let Some(found) = result.into_owned() {
                owned.push(found);
            }

            let scanned = index + 1;
            if scanned % self.config.batch_size.max(1) == 0 && scanned < announcements.len() {
                progress.scanned = session.total_scanned;
                progress.view_tag_filtered = session.view_tag_filtered;
                progress.discoveries = session.discoveries;
                progress_callback(progress.clone());
            }
        }

        progress.scanned = session.total_scanned;
        progress.view_tag_filtered = session.view_tag_filtered;
        progress.discoveries = session.discoveries;
        progress_callback(progress);

        session.duration_ms = start.elapsed().as_millis() as u64;
        self.finish(&session);
        owned
    }

    /// Scans a block range and keeps the owned addresses with a non-zero balance.
    ///
    /// An address announced more than once is reported once.
    #[instrument(skip(self, announcer, ledger))]
    pub async fn discover_funded(
        &self,
        announcer: &dyn Announcer,
        ledger: &dyn Ledger,
        range: BlockRange,
    ) -> Result<Vec<FundedStealthAddress>> {
        let owned = self.scan_from(announcer, range).await?;

        let mut seen: HashSet<EthAddress> = HashSet::with_capacity(owned.len());
        let mut funded = Vec::new();
        for found in owned {
            if !seen.insert(found.stealth_address) {
                continue;
            }

            let balance = ledger.balance(found.stealth_address).await?;
            if balance > 0 {
                funded.push(FundedStealthAddress {
                    owned: found,
                    balance,
                });
            }
        }

        info!(funded = funded.len(), "Balance lookup complete");
        Ok(funded)
    }

    fn merge_position(&self, batch: &ScanPosition) {
        let mut position = self.position.write();
        position.last_id = batch.last_id;
        if let Some(block) = batch.last_block {
            position.last_block = Some(position.last_block.map_or(block, |b| b.max(block)));
        }
        position.total_scanned += batch.total_scanned;
        position.total_discoveries += batch.total_discoveries;
    }

    fn finish(&self, session: &ScanStats) {
        let mut stats = self.stats.write();
        stats.merge(session);
        stats.duration_ms += session.duration_ms;

        info!(
            discoveries = session.discoveries,
            scanned = session.total_scanned,
            view_tag_filtered = session.view_tag_filtered,
            malformed = session.malformed,
            duration_ms = session.duration_ms,
            rate = format!("{:.2}/s", session.rate()),
            "Scan complete"
        );
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("spending_pk", &self.keys.spending_pk)
            .field("config", &self.config)
            .field("viewing_sk", &"[REDACTED]")
            .finish()
    }
}

/// Scan result summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of announcements scanned
    pub total_scanned: u64,
    /// Number rejected by the view tag alone
    pub view_tag_filtered: u64,
    /// Number skipped for an unsupported scheme
    pub unsupported_scheme: u64,
    /// Number of malformed records skipped
    pub malformed: u64,
    /// Number of payments discovered
    pub discoveries: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Scan rate (announcements per second)
    pub rate: f64,
    /// Filter efficiency (% filtered by view tag)
    pub filter_efficiency: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            total_scanned: stats.total_scanned,
            view_tag_filtered: stats.view_tag_filtered,
            unsupported_scheme: stats.unsupported_scheme,
            malformed: stats.malformed,
            discoveries: stats.discoveries,
            duration_ms: stats.duration_ms,
            rate: stats.rate(),
            filter_efficiency: stats.filter_efficiency(),
        }
    }
}
