//! # SHADOW Core
//!
//! Core types, errors, and traits for the SHADOW stealth address wallet.
//!
//! This crate provides the foundational building blocks used by all other SHADOW crates:
//!
//! - **Types**: Domain models for keys, addresses, meta-addresses, announcements and vaults
//! - **Errors**: A single error taxonomy with classification helpers
//! - **Constants**: Protocol constants and sizes
//! - **Traits**: Boundaries to the external registry, announcer, ledger and vault storage
//!
//! ## Example
//!
//! ```rust
//! use shadow_core::{Announcement, EthAddress, ShadowError};
//!
//! let announcement = Announcement::new(EthAddress::zero(), vec![0x02; 33]);
//! let json = serde_json::to_string(&announcement).unwrap();
//! assert!(json.contains("\"scheme_id\":1"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, ShadowError};
pub use traits::*;
pub use types::*;
