//! Address types for SHADOW.
//!
//! - [`EthAddress`]: A 20-byte Ethereum address, displayed in EIP-55 form
//! - [`StealthMetaAddress`]: The public spending + viewing keys a recipient publishes

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::PublicKey;
use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, ETH_ADDRESS_SIZE, META_ADDRESS_SIZE};
use crate::error::{Result, ShadowError};

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A standard 20-byte Ethereum address.
///
/// Parsing is case-insensitive and equality is byte equality, so two textual
/// forms of the same address always compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress {
    bytes: [u8; ETH_ADDRESS_SIZE],
}

impl EthAddress {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ETH_ADDRESS_SIZE {
            return Err(ShadowError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ETH_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; ETH_ADDRESS_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; ETH_ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the EIP-55 mixed-case checksum form.
    pub fn to_checksum_string(&self) -> String {
        let lower = hex::encode(self.bytes);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parses from hex string (with or without 0x prefix, any case).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the zero address.
    pub fn zero() -> Self {
        Self {
            bytes: [0u8; ETH_ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthAddress({})", self.to_checksum_string())
    }
}

impl std::fmt::Display for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_checksum_string())
    }
}

impl std::str::FromStr for EthAddress {
    type Err = ShadowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for EthAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_checksum_string())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth meta-address published for receiving private payments.
///
/// This is what gets registered under a username in the name registry.
/// Senders use it to derive a fresh stealth address per payment.
///
/// # Structure
/// 66 bytes: `compressed(spending_pk) ‖ compressed(viewing_pk)`, no hashing,
/// no version byte. Text form is `0x`-prefixed lowercase hex.
///
/// # Example
/// ```
/// use shadow_core::StealthMetaAddress;
///
/// let hex = "0x0376bf533d4b15510fa9f4124b6e48616f07debcf2ef0cfb185cdc4a576450b475\
///            02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d";
/// let meta = StealthMetaAddress::from_hex(hex).unwrap();
/// assert_eq!(meta.to_hex(), hex);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StealthMetaAddress {
    /// Spending public key - the base point every stealth address is tweaked from
    pub spending_pk: PublicKey,
    /// Viewing public key - the ECDH counterpart of each ephemeral key
    pub viewing_pk: PublicKey,
}

impl StealthMetaAddress {
    /// Creates a meta-address from its two public keys.
    pub fn new(spending_pk: PublicKey, viewing_pk: PublicKey) -> Self {
        Self {
            spending_pk,
            viewing_pk,
        }
    }

    /// Validates the meta-address structure.
    pub fn validate(&self) -> Result<()> {
        if self.spending_pk == self.viewing_pk {
            return Err(ShadowError::InvalidMetaAddress(
                "spending and viewing keys must differ".into(),
            ));
        }
        Ok(())
    }

    /// Serializes to the 66-byte wire form.
    pub fn to_bytes(&self) -> [u8; META_ADDRESS_SIZE] {
        let mut bytes = [0u8; META_ADDRESS_SIZE];
        bytes[..COMPRESSED_PUBLIC_KEY_SIZE].copy_from_slice(self.spending_pk.as_bytes());
        bytes[COMPRESSED_PUBLIC_KEY_SIZE..].copy_from_slice(self.viewing_pk.as_bytes());
        bytes
    }

    /// Parses the 66-byte wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != META_ADDRESS_SIZE {
            return Err(ShadowError::InvalidMetaAddress(format!(
                "expected {} bytes, got {}",
                META_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let spending_pk = PublicKey::from_bytes(&bytes[..COMPRESSED_PUBLIC_KEY_SIZE])
            .map_err(|e| ShadowError::InvalidMetaAddress(format!("spending key: {e}")))?;
        let viewing_pk = PublicKey::from_bytes(&bytes[COMPRESSED_PUBLIC_KEY_SIZE..])
            .map_err(|e| ShadowError::InvalidMetaAddress(format!("viewing key: {e}")))?;

        let meta = Self::new(spending_pk, viewing_pk);
        meta.validate()?;
        Ok(meta)
    }

    /// Encodes to `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Decodes from hex (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Display for StealthMetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for StealthMetaAddress {
    type Err = ShadowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for StealthMetaAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for StealthMetaAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SPENDING: &str = "0376bf533d4b15510fa9f4124b6e48616f07debcf2ef0cfb185cdc4a576450b475";
    const VIEWING: &str = "02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d";

    fn sample_meta() -> StealthMetaAddress {
        StealthMetaAddress::new(
            PublicKey::from_hex(SPENDING).unwrap(),
            PublicKey::from_hex(VIEWING).unwrap(),
        )
    }

    #[test]
    fn test_meta_address_layout() {
        let bytes = sample_meta().to_bytes();
        assert_eq!(hex::encode(&bytes[..33]), SPENDING);
        assert_eq!(hex::encode(&bytes[33..]), VIEWING);
    }

    #[test]
    fn test_meta_address_hex_roundtrip() {
        let meta = sample_meta();
        let hex = meta.to_hex();
        assert_eq!(hex, format!("0x{SPENDING}{VIEWING}"));
        assert_eq!(StealthMetaAddress::from_hex(&hex).unwrap(), meta);
        assert_eq!(
            StealthMetaAddress::from_hex(&hex.to_uppercase().replacen("0X", "", 1)).unwrap(),
            meta
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("0x" ; "bare prefix")]
    #[test_case("0x0376bf" ; "truncated")]
    fn test_meta_address_rejects_short(input: &str) {
        assert!(matches!(
            StealthMetaAddress::from_hex(input),
            Err(ShadowError::InvalidMetaAddress(_))
        ));
    }

    #[test]
    fn test_meta_address_rejects_identical_keys() {
        let hex = format!("{SPENDING}{SPENDING}");
        assert!(StealthMetaAddress::from_hex(&hex).is_err());
    }

    #[test]
    fn test_meta_address_serde() {
        let meta = sample_meta();
        let json = serde_json::to_string(&meta).unwrap();
        let back: StealthMetaAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }

    #[test_case("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf", "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf")]
    #[test_case("a8e070649a1d98651d281fdd428bd3eec0d279e0", "0xa8E070649A1D98651D281FdD428BD3EeC0d279e0")]
    #[test_case("0xc95659c38c4a3c90c3cbec303f056c11ee717104", "0xC95659C38C4A3C90c3cBEc303F056C11ee717104")]
    fn test_eth_address_checksum(input: &str, expected: &str) {
        let addr = EthAddress::from_hex(input).unwrap();
        assert_eq!(addr.to_checksum_string(), expected);
    }

    #[test]
    fn test_eth_address_case_insensitive_equality() {
        let a = EthAddress::from_hex("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap();
        let b = EthAddress::from_hex("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_eth_address_zero() {
        let zero = EthAddress::zero();
        assert!(zero.is_zero());

        let non_zero = EthAddress::from_array([1; 20]);
        assert!(!non_zero.is_zero());
    }

    #[test]
    fn test_eth_address_wrong_length() {
        assert!(matches!(
            EthAddress::from_hex("0x1234"),
            Err(ShadowError::InvalidAddress(_))
        ));
    }
}
