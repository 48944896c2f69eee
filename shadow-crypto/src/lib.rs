//! # SHADOW Cryptography
//!
//! secp256k1 stealth address primitives for the SHADOW wallet.
//!
//! This crate provides:
//!
//! - **HD**: BIP-39 mnemonics and BIP-32 master/spending/viewing keys
//! - **Vault**: PBKDF2 + AES-256-CBC encryption of the seed phrase
//! - **ECDH**: Shared secrets between ephemeral and viewing keys
//! - **Derivation**: Stealth public keys, addresses and private keys
//! - **View Tags**: One-byte scan filter
//!
//! ## Security Properties
//!
//! - Private keys, shared secrets, stretched keys and decrypted seeds are zeroized on drop
//! - Address and view-tag comparisons are constant-time
//! - Vault failures never distinguish padding errors from wrong passwords
//!
//! ## Example
//!
//! ```rust
//! use shadow_crypto::{derive_keys, derive_stealth_address, generate_key_pair, shared_secret};
//!
//! let phrase = "abandon abandon abandon abandon abandon abandon \
//!               abandon abandon abandon abandon abandon about";
//! let keys = derive_keys(phrase).unwrap();
//!
//! // Sender side
//! let ephemeral = generate_key_pair().unwrap();
//! let secret = shared_secret(&ephemeral.private_key, &keys.viewing.public_key).unwrap();
//! let stealth = derive_stealth_address(&keys.spending.public_key, &secret).unwrap();
//!
//! // Receiver side
//! let secret = shared_secret(&keys.viewing.private_key, &ephemeral.public_key).unwrap();
//! assert_eq!(derive_stealth_address(&keys.spending.public_key, &secret).unwrap(), stealth);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod curve;
pub mod derive;
pub mod ecdh;
pub mod hash;
pub mod hd;
pub mod vault;
pub mod view_tag;

// Re-export main functions at crate root
pub use curve::{generate_key_pair, key_pair_from_private_key, public_key_address};
pub use derive::{
    derive_stealth_address, derive_stealth_private_key, derive_stealth_public_key,
    verify_stealth_address,
};
pub use ecdh::{shared_secret, SharedSecret};
pub use hash::keccak256;
pub use hd::{
    decode_meta_address, derive_keys, encode_meta_address, generate_mnemonic, validate_mnemonic,
    wallet_meta_address,
};
pub use vault::{open, reseal, seal, stretch};
pub use view_tag::{compute_view_tag, verify_view_tag};
