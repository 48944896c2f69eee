//! Key types for SHADOW.
//!
//! This module defines the key structures used in the protocol:
//!
//! - [`PublicKey`]: SEC1 compressed secp256k1 point (33 bytes)
//! - [`PrivateKey`]: secp256k1 scalar (32 bytes, zeroized on drop)
//! - [`KeyPair`]: Private key, public key and derived address
//! - [`WalletKeyPairs`]: The master, spending and viewing key pairs of one seed

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::EthAddress;
use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};
use crate::error::{Result, ShadowError};

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressed secp256k1 public key.
///
/// Only the encoding is checked here (length and 0x02/0x03 prefix); whether the
/// bytes lie on the curve is checked when the key is used for arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Creates a new public key from raw bytes.
    ///
    /// # Errors
    /// Returns error if the length is not 33 or the prefix is not 0x02/0x03.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(ShadowError::InvalidKeySize {
                expected: COMPRESSED_PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(ShadowError::InvalidPublicKey(format!(
                "unexpected SEC1 prefix 0x{:02x}",
                bytes[0]
            )));
        }

        let mut arr = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Returns the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the public key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Returns the hex-encoded public key (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Creates a public key from hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PublicKey({}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[COMPRESSED_PUBLIC_KEY_SIZE - 4..])
        )
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

// Serde implementation that uses hex encoding
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("0x{}", self.to_hex()))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// secp256k1 private key as a 32-byte big-endian scalar.
///
/// This key is sensitive and will be automatically zeroized when dropped.
/// Never expose this key in logs or error messages.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; PRIVATE_KEY_SIZE],
}

impl PrivateKey {
    /// Creates a new private key from raw bytes.
    ///
    /// # Errors
    /// Returns error if bytes length doesn't match `PRIVATE_KEY_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(ShadowError::InvalidKeySize {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut arr = [0u8; PRIVATE_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a private key from a fixed-size array.
    pub fn from_array(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses a private key from hex (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(s)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Returns the raw bytes of the private key.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the private key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.bytes
    }

    /// Hex-encodes the key for explicit export.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose secret key content
        write!(f, "PrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A secp256k1 key pair with its Ethereum address.
///
/// `public_key = private_key · G` and
/// `address = low20(keccak256(uncompressed(public_key)[1..]))`; construct
/// through `shadow_crypto` so both hold.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    /// Secret scalar (auto-zeroized)
    pub private_key: PrivateKey,
    /// Compressed public key
    #[zeroize(skip)]
    pub public_key: PublicKey,
    /// Ethereum address controlled by this key
    #[zeroize(skip)]
    pub address: EthAddress,
}

impl KeyPair {
    /// Assembles a key pair from already-consistent parts.
    pub fn new(private_key: PrivateKey, public_key: PublicKey, address: EthAddress) -> Self {
        Self {
            private_key,
            public_key,
            address,
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET KEY SET
// ═══════════════════════════════════════════════════════════════════════════════

/// All key pairs derived from one seed phrase.
///
/// Recomputed from the decrypted seed whenever a password is supplied and
/// never persisted.
#[derive(Clone, ZeroizeOnDrop)]
pub struct WalletKeyPairs {
    /// BIP-32 root key; owns the registered username and pays from the main account
    pub master: KeyPair,
    /// Child 0; its public key is the first half of the meta-address
    pub spending: KeyPair,
    /// Child 1; its private key lets the holder scan announcements
    pub viewing: KeyPair,
}

impl std::fmt::Debug for WalletKeyPairs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeyPairs")
            .field("master", &self.master)
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}
