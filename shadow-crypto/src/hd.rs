//! Hierarchical deterministic key derivation.
//!
//! ```text
//! mnemonic ──BIP-39──▶ seed (64 bytes, empty passphrase)
//!                         │
//!                     BIP-32 root ─────────── master   (m)
//!                         ├── child 0 ─────── spending (m/0)
//!                         └── child 1 ─────── viewing  (m/1)
//! ```
//!
//! Both children are non-hardened. The same phrase yields byte-identical
//! keys on every call and in every client that uses the same path constants.

use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use shadow_core::constants::{SPENDING_KEY_INDEX, VIEWING_KEY_INDEX};
use shadow_core::error::{Result, ShadowError};
use shadow_core::types::{KeyPair, PrivateKey, PublicKey, StealthMetaAddress, WalletKeyPairs};

use crate::curve::{key_pair_from_private_key, to_curve_point};

// ═══════════════════════════════════════════════════════════════════════════════
// MNEMONICS
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_mnemonic(seed_phrase: &str) -> Result<Mnemonic> {
    let normalized = Zeroizing::new(seed_phrase.trim().to_lowercase());
    Mnemonic::parse(normalized.as_str()).map_err(|e| ShadowError::InvalidMnemonic(e.to_string()))
}

/// Returns true if the phrase passes word-list and checksum validation.
pub fn validate_mnemonic(seed_phrase: &str) -> bool {
    parse_mnemonic(seed_phrase).is_ok()
}

/// Generates a fresh English mnemonic from OS entropy.
///
/// # Arguments
///
/// * `word_count` - 12, 15, 18, 21 or 24
pub fn generate_mnemonic(word_count: usize) -> Result<Zeroizing<String>> {
    if !matches!(word_count, 12 | 15 | 18 | 21 | 24) {
        return Err(ShadowError::ValidationError(format!(
            "unsupported mnemonic length: {word_count} words"
        )));
    }

    // 32 bits of entropy per 3 words
    let mut entropy = Zeroizing::new(vec![0u8; word_count * 4 / 3]);
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| ShadowError::KeyDerivationError(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

fn key_pair_from_xprv(xprv: &XPrv) -> Result<KeyPair> {
    let mut bytes = xprv.to_bytes();
    let private_key = PrivateKey::from_array(bytes);
    bytes.zeroize();
    key_pair_from_private_key(private_key)
}

fn derive_child(root: &XPrv, index: u32) -> Result<KeyPair> {
    let child_number = ChildNumber::new(index, false)
        .map_err(|e| ShadowError::KeyDerivationError(e.to_string()))?;
    let child = root
        .derive_child(child_number)
        .map_err(|e| ShadowError::KeyDerivationError(e.to_string()))?;
    key_pair_from_xprv(&child)
}

/// Derives the master, spending and viewing key pairs from a seed phrase.
///
/// # Errors
/// `InvalidMnemonic` if the phrase fails word-list or checksum validation.
pub fn derive_keys(seed_phrase: &str) -> Result<WalletKeyPairs> {
    let mnemonic = parse_mnemonic(seed_phrase)?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));

    let root = XPrv::new(&*seed).map_err(|e| ShadowError::KeyDerivationError(e.to_string()))?;

    Ok(WalletKeyPairs {
        master: key_pair_from_xprv(&root)?,
        spending: derive_child(&root, SPENDING_KEY_INDEX)?,
        viewing: derive_child(&root, VIEWING_KEY_INDEX)?,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS ENCODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Concatenates the compressed spending and viewing keys.
pub fn encode_meta_address(spending_pk: &PublicKey, viewing_pk: &PublicKey) -> StealthMetaAddress {
    StealthMetaAddress::new(*spending_pk, *viewing_pk)
}

/// Meta-address of a derived key set.
pub fn wallet_meta_address(keys: &WalletKeyPairs) -> StealthMetaAddress {
    encode_meta_address(&keys.spending.public_key, &keys.viewing.public_key)
}

/// Splits a meta-address back into its spending and viewing keys, checking
/// that both are points on the curve.
pub fn decode_meta_address(meta: &StealthMetaAddress) -> Result<(PublicKey, PublicKey)> {
    to_curve_point(&meta.spending_pk)
        .map_err(|e| ShadowError::InvalidMetaAddress(format!("spending key: {e}")))?;
    to_curve_point(&meta.viewing_pk)
        .map_err(|e| ShadowError::InvalidMetaAddress(format!("viewing key: {e}")))?;
    Ok((meta.spending_pk, meta.viewing_pk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_derive_keys_vector() {
        let keys = derive_keys(MNEMONIC).unwrap();

        assert_eq!(
            keys.master.private_key.to_hex(),
            "1837c1be8e2995ec11cda2b066151be2cfb48adf9e47b151d46adab3a21cdf67"
        );
        assert_eq!(
            keys.master.public_key.to_hex(),
            "03d902f35f560e0470c63313c7369168d9d7df2d49bf295fd9fb7cb109ccee0494"
        );
        assert_eq!(
            keys.master.address.to_checksum_string(),
            "0xa8E070649A1D98651D281FdD428BD3EeC0d279e0"
        );

        assert_eq!(
            keys.spending.private_key.to_hex(),
            "baa89a8bdd61c5e22b9f10601d8791c9f8fc4b2fa6df9d68d336f0eb03b06eb6"
        );
        assert_eq!(
            keys.spending.public_key.to_hex(),
            "0376bf533d4b15510fa9f4124b6e48616f07debcf2ef0cfb185cdc4a576450b475"
        );
        assert_eq!(
            keys.spending.address.to_checksum_string(),
            "0xd37e28350150dc6D92847eE5Bd86710e86Eb3564"
        );

        assert_eq!(
            keys.viewing.private_key.to_hex(),
            "c1beaff0c4db984670a40c69c2947b9d33cd7f6e749c67e1fcb5c6118dda1282"
        );
        assert_eq!(
            keys.viewing.public_key.to_hex(),
            "02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d"
        );
        assert_eq!(
            keys.viewing.address.to_checksum_string(),
            "0x86Fb17D81E4727f1655531C2318271e7fD11bF53"
        );
    }

    #[test]
    fn test_derive_keys_deterministic() {
        let a = derive_keys(MNEMONIC).unwrap();
        let b = derive_keys(MNEMONIC).unwrap();
        assert_eq!(a.master.private_key.as_bytes(), b.master.private_key.as_bytes());
        assert_eq!(a.spending.public_key, b.spending.public_key);
        assert_eq!(a.viewing.address, b.viewing.address);
    }

    #[test]
    fn test_derived_keys_are_distinct() {
        let keys = derive_keys(MNEMONIC).unwrap();
        assert_ne!(keys.master.public_key, keys.spending.public_key);
        assert_ne!(keys.master.public_key, keys.viewing.public_key);
        assert_ne!(keys.spending.public_key, keys.viewing.public_key);
    }

    #[test]
    fn test_phrase_whitespace_and_case_normalized() {
        let messy = format!("  {}  ", MNEMONIC.to_uppercase().replace(' ', "   "));
        let keys = derive_keys(&messy).unwrap();
        assert_eq!(
            keys.master.address.to_checksum_string(),
            "0xa8E070649A1D98651D281FdD428BD3EeC0d279e0"
        );
    }

    #[test_case("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon" ; "bad checksum")]
    #[test_case("abandon abandon abandon" ; "too short")]
    #[test_case("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon shadoww" ; "unknown word")]
    #[test_case("" ; "empty")]
    fn test_invalid_mnemonic(phrase: &str) {
        assert!(!validate_mnemonic(phrase));
        assert!(matches!(derive_keys(phrase), Err(ShadowError::InvalidMnemonic(_))));
    }

    #[test_case(12)]
    #[test_case(24)]
    fn test_generate_mnemonic(words: usize) {
        let phrase = generate_mnemonic(words).unwrap();
        assert_eq!(phrase.split_whitespace().count(), words);
        assert!(validate_mnemonic(&phrase));
        assert!(derive_keys(&phrase).is_ok());
    }

    #[test]
    fn test_generate_mnemonic_rejects_odd_length() {
        assert!(generate_mnemonic(13).is_err());
    }

    #[test]
    fn test_meta_address_encoding() {
        let keys = derive_keys(MNEMONIC).unwrap();
        let meta = wallet_meta_address(&keys);

        assert_eq!(
            meta.to_hex(),
            "0x0376bf533d4b15510fa9f4124b6e48616f07debcf2ef0cfb185cdc4a576450b475\
             02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d"
        );

        let (spending, viewing) = decode_meta_address(&meta).unwrap();
        assert_eq!(spending, keys.spending.public_key);
        assert_eq!(viewing, keys.viewing.public_key);
    }

    #[test]
    fn test_decode_meta_address_rejects_off_curve_key() {
        let keys = derive_keys(MNEMONIC).unwrap();
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[32] = 5;
        let meta = encode_meta_address(&keys.spending.public_key, &PublicKey::from_bytes(&bytes).unwrap());
        assert!(matches!(
            decode_meta_address(&meta),
            Err(ShadowError::InvalidMetaAddress(_))
        ));
    }
}
