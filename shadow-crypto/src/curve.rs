//! secp256k1 key handling.
//!
//! Conversions between the fixed-size key wrappers in `shadow_core` and
//! `k256` curve types, plus key-pair construction and generation.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use shadow_core::error::{Result, ShadowError};
use shadow_core::types::{EthAddress, KeyPair, PrivateKey, PublicKey};

use crate::hash::eth_address_from_uncompressed;

/// Parses a compressed public key into a curve point.
///
/// # Errors
/// `InvalidPublicKey` if the bytes are not on the curve.
pub fn to_curve_point(public_key: &PublicKey) -> Result<k256::PublicKey> {
    k256::PublicKey::from_sec1_bytes(public_key.as_bytes())
        .map_err(|_| ShadowError::InvalidPublicKey("not a point on secp256k1".into()))
}

/// Parses a private key into a non-zero scalar below the curve order.
pub fn to_secret_key(private_key: &PrivateKey) -> Result<SecretKey> {
    SecretKey::from_slice(private_key.as_bytes())
        .map_err(|_| ShadowError::InvalidPrivateKey("zero or not below the curve order".into()))
}

/// Compresses a curve point.
pub fn compress(point: &k256::PublicKey) -> Result<PublicKey> {
    PublicKey::from_bytes(point.to_encoded_point(true).as_bytes())
}

/// Ethereum address of a curve point.
pub fn curve_point_address(point: &k256::PublicKey) -> Result<EthAddress> {
    eth_address_from_uncompressed(point.to_encoded_point(false).as_bytes())
}

/// Ethereum address of a compressed public key.
pub fn public_key_address(public_key: &PublicKey) -> Result<EthAddress> {
    curve_point_address(&to_curve_point(public_key)?)
}

/// Builds the full key pair (public key and address) for a private key.
pub fn key_pair_from_private_key(private_key: PrivateKey) -> Result<KeyPair> {
    let secret = to_secret_key(&private_key)?;
    let point = secret.public_key();
    let public_key = compress(&point)?;
    let address = curve_point_address(&point)?;
    Ok(KeyPair::new(private_key, public_key, address))
}

/// Generates a fresh key pair from the OS RNG.
pub fn generate_key_pair() -> Result<KeyPair> {
    generate_key_pair_with_rng(&mut OsRng)
}

/// Generates a key pair from the supplied RNG.
pub fn generate_key_pair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<KeyPair> {
    let secret = SecretKey::random(rng);
    let bytes: [u8; 32] = secret.to_bytes().into();
    key_pair_from_private_key(PrivateKey::from_array(bytes))
}
