//! # SHADOW Registry
//!
//! Reference implementations of the collaborator traits in `shadow_core::traits`.
//!
//! - **Memory**: Name registry, announcement log and vault slot for development and testing
//! - **Ledger**: In-memory balances and transfers
//! - **File**: JSON-file announcement log and vault store for the CLI
//!
//! ## Example
//!
//! ```rust
//! use shadow_core::{Announcement, Announcer, BlockRange, EthAddress};
//! use shadow_registry::MemoryRegistry;
//!
//! # tokio_test::block_on(async {
//! let registry = MemoryRegistry::new();
//! let announcement = Announcement::with_view_tag(EthAddress::from_array([1; 20]), vec![0x02; 33], 0x13);
//!
//! let id = registry.announce(announcement).await.unwrap();
//! let log = registry.announcements(BlockRange::all()).await.unwrap();
//! assert_eq!(log[0].id, id);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod ledger;
mod memory;

pub use file::{FileAnnouncer, FileVaultStore};
pub use ledger::MemoryLedger;
pub use memory::{MemoryRegistry, MemoryVaultStore};
