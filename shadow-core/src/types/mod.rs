//! Domain types for SHADOW.
//!
//! This module provides all the core data structures used throughout the protocol:
//!
//! - [`KeyPair`] / [`WalletKeyPairs`]: secp256k1 keys with their addresses
//! - [`StealthMetaAddress`]: Published spending + viewing public keys
//! - [`EthAddress`]: 20-byte account address
//! - [`Announcement`]: Published stealth address + ephemeral key
//! - [`EncryptedVault`]: The password-encrypted seed phrase

mod keys;
mod address;
mod announcement;
mod vault;

pub use keys::*;
pub use address::*;
pub use announcement::*;
pub use vault::*;
