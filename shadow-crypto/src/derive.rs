//! Stealth key and address derivation.
//!
//! This module implements the core cryptographic operations for deriving
//! stealth public/private keys and Ethereum addresses.
//!
//! ## Derivation Flow
//!
//! ```text
//! shared_secret = ECDH(ephemeral_sk, viewing_pk) = ECDH(viewing_sk, ephemeral_pk)
//!       ↓
//! tweak = keccak256(shared_secret) mod n
//!       ↓
//! stealth_pk = spending_pk + tweak · G
//!       ↓
//! address = keccak256(uncompressed(stealth_pk)[1..])[12..32]
//! ```
//!
//! ## Private Key Derivation
//!
//! The recipient, holding both private keys, can derive the stealth private key:
//!
//! ```text
//! stealth_sk = (spending_sk + tweak) mod n
//! ```

use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, ProjectivePoint, Scalar, U256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use shadow_core::error::{Result, ShadowError};
use shadow_core::types::{EthAddress, PrivateKey, PublicKey};

use crate::curve::{compress, curve_point_address, to_curve_point, to_secret_key};
use crate::ecdh::{shared_secret, SharedSecret};
use crate::hash::keccak256;

// ═══════════════════════════════════════════════════════════════════════════════
// TWEAK
// ═══════════════════════════════════════════════════════════════════════════════

/// Reduces `keccak256(shared_secret)` modulo the curve order.
///
/// # Errors
/// `DegenerateTweak` if the reduced value is zero.
pub fn hash_to_tweak(shared_secret: &SharedSecret) -> Result<Scalar> {
    let mut hash = keccak256(shared_secret.as_bytes());
    let tweak = <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(&hash));
    hash.zeroize();

    if tweak == Scalar::ZERO {
        return Err(ShadowError::DegenerateTweak);
    }
    Ok(tweak)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH PUBLIC KEY DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

fn stealth_point(spending_pk: &PublicKey, shared_secret: &SharedSecret) -> Result<k256::PublicKey> {
    let spending = to_curve_point(spending_pk)?;
    let tweak = hash_to_tweak(shared_secret)?;

    let point = spending.to_projective() + ProjectivePoint::GENERATOR * tweak;

    // Fails only for the identity point
    k256::PublicKey::from_affine(point.to_affine()).map_err(|_| ShadowError::DegenerateTweak)
}

/// Derives the stealth public key `spending_pk + tweak · G`.
///
/// # Arguments
///
/// * `spending_pk` - The recipient's spending public key
/// * `shared_secret` - ECDH secret between the ephemeral and viewing keys
pub fn derive_stealth_public_key(
    spending_pk: &PublicKey,
    shared_secret: &SharedSecret,
) -> Result<PublicKey> {
    compress(&stealth_point(spending_pk, shared_secret)?)
}

/// Derives the stealth address.
///
/// Senders and receivers call this same function; the two sides agree because
/// their shared secrets are equal.
pub fn derive_stealth_address(
    spending_pk: &PublicKey,
    shared_secret: &SharedSecret,
) -> Result<EthAddress> {
    curve_point_address(&stealth_point(spending_pk, shared_secret)?)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH PRIVATE KEY DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Derives the stealth private key from the spending key and a shared secret.
///
/// # Security
///
/// The result is the only key controlling the stealth address. It is
/// zeroized when dropped.
pub fn derive_stealth_private_key_from_secret(
    spending_sk: &PrivateKey,
    shared_secret: &SharedSecret,
) -> Result<PrivateKey> {
    let spending = *to_secret_key(spending_sk)?.to_nonzero_scalar();
    let tweak = hash_to_tweak(shared_secret)?;

    let stealth = spending + tweak;
    if stealth == Scalar::ZERO {
        return Err(ShadowError::DegenerateTweak);
    }

    let mut bytes: [u8; 32] = stealth.to_bytes().into();
    let key = PrivateKey::from_array(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Derives the stealth private key for an announced ephemeral key.
///
/// ```text
/// stealth_sk = (spending_sk + keccak256(ECDH(viewing_sk, ephemeral_pk))) mod n
/// ```
///
/// Callers must check that the resulting key controls the expected stealth
/// address before using it.
pub fn derive_stealth_private_key(
    spending_sk: &PrivateKey,
    viewing_sk: &PrivateKey,
    ephemeral_pk: &PublicKey,
) -> Result<PrivateKey> {
    let shared = shared_secret(viewing_sk, ephemeral_pk)?;
    derive_stealth_private_key_from_secret(spending_sk, &shared)
}

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that a stealth address was derived from this spending key and secret.
///
/// Used to confirm a discovered payment is actually for this recipient.
pub fn verify_stealth_address(
    spending_pk: &PublicKey,
    shared_secret: &SharedSecret,
    expected_address: &EthAddress,
) -> Result<bool> {
    let derived = derive_stealth_address(spending_pk, shared_secret)?;
    Ok(derived.as_bytes().ct_eq(expected_address.as_bytes()).into())
}
