//! Keccak-256 hashing and Ethereum address derivation.
//!
//! Keccak-256 is used for three things in the protocol:
//!
//! ```text
//! address = keccak256(uncompressed_pubkey[1..])[12..32]
//! tweak   = keccak256(shared_secret) mod n
//! tag     = keccak256(shared_secret)[0]
//! ```

use sha3::{Digest, Keccak256};

use shadow_core::constants::{ETH_ADDRESS_SIZE, KECCAK256_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE};
use shadow_core::error::{Result, ShadowError};
use shadow_core::types::EthAddress;

/// Computes Keccak256 hash.
///
/// Note: Keccak256 is NOT SHA3-256. They use different padding.
pub fn keccak256(input: &[u8]) -> [u8; KECCAK256_SIZE] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Derives an Ethereum address from an uncompressed SEC1 public key.
///
/// # Arguments
///
/// * `uncompressed` - 65 bytes starting with `0x04`
pub fn eth_address_from_uncompressed(uncompressed: &[u8]) -> Result<EthAddress> {
    if uncompressed.len() != UNCOMPRESSED_PUBLIC_KEY_SIZE {
        return Err(ShadowError::InvalidKeySize {
            expected: UNCOMPRESSED_PUBLIC_KEY_SIZE,
            actual: uncompressed.len(),
        });
    }
    if uncompressed[0] != 0x04 {
        return Err(ShadowError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = keccak256(&uncompressed[1..]);

    // Take last 20 bytes as Ethereum address
    let mut address_bytes = [0u8; ETH_ADDRESS_SIZE];
    address_bytes.copy_from_slice(&hash[KECCAK256_SIZE - ETH_ADDRESS_SIZE..]);

    Ok(EthAddress::from_array(address_bytes))
}
