//! View tag computation for efficient scanning.
//!
//! View tags enable recipients to quickly filter announcements:
//! - Each scheme-1 announcement carries a 1-byte view tag as its first metadata byte
//! - Recipients compute their expected view tag from the shared secret
//! - Only announcements with matching view tags need the point addition and address hash
//!
//! ## Efficiency
//!
//! With 1-byte view tags (256 possible values), ~99.6% of announcements
//! are rejected after the ECDH alone.
//!
//! ## Security
//!
//! View tags leak 1 byte of the keccak hash of the shared secret, which
//! leaves 248 bits of the tweak unknown to observers.

use subtle::ConstantTimeEq;

use crate::ecdh::SharedSecret;
use crate::hash::keccak256;

/// Computes the view tag from a shared secret.
///
/// The view tag is the first byte of `keccak256(shared_secret)`.
pub fn compute_view_tag(shared_secret: &SharedSecret) -> u8 {
    keccak256(shared_secret.as_bytes())[0]
}

/// Checks if a view tag matches the expected value for a shared secret.
///
/// This is a constant-time comparison to prevent timing attacks.
pub fn verify_view_tag(shared_secret: &SharedSecret, expected_tag: u8) -> bool {
    let computed_tag = compute_view_tag(shared_secret);
    computed_tag.ct_eq(&expected_tag).into()
}
