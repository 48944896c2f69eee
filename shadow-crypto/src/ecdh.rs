//! Elliptic-curve Diffie-Hellman over secp256k1.
//!
//! The shared secret is the 32-byte x-coordinate of `a · B`, so
//! `shared_secret(a, B) == shared_secret(b, A)` for any two key pairs.

use zeroize::{Zeroize, ZeroizeOnDrop};

use shadow_core::constants::SHARED_SECRET_SIZE;
use shadow_core::error::Result;
use shadow_core::types::{PrivateKey, PublicKey};

use crate::curve::{to_curve_point, to_secret_key};

/// ECDH shared secret. Never transmitted; zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    /// Wraps raw secret bytes.
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

/// Computes the shared secret between `private_key` and `public_key`.
///
/// # Errors
/// Fails if either key is not a valid secp256k1 key.
pub fn shared_secret(private_key: &PrivateKey, public_key: &PublicKey) -> Result<SharedSecret> {
    let secret = to_secret_key(private_key)?;
    let point = to_curve_point(public_key)?;

    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), point.as_affine());

    let mut bytes = [0u8; SHARED_SECRET_SIZE];
    bytes.copy_from_slice(shared.raw_secret_bytes().as_slice());
    Ok(SharedSecret(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{generate_key_pair, key_pair_from_private_key};
    use proptest::prelude::*;

    const VIEWING_PUB: &str = "02ea2649b3512b9a859ab658a85e2989a7ae39b2518877b2dc0f2b44b785d5788d";
    const VIEWING_PRIV: &str = "c1beaff0c4db984670a40c69c2947b9d33cd7f6e749c67e1fcb5c6118dda1282";
    const EPHEMERAL_PUB: &str = "031b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f";
    const SHARED: &str = "24f6fc53a8f0dcb11586ee70307335797a517933488ac60c86a1d1c2ca95ec25";

    #[test]
    fn test_shared_secret_vector() {
        let ephemeral = PrivateKey::from_array([0x01; 32]);
        let viewing_pub = PublicKey::from_hex(VIEWING_PUB).unwrap();

        let sender = shared_secret(&ephemeral, &viewing_pub).unwrap();
        assert_eq!(hex::encode(sender.as_bytes()), SHARED);

        let receiver = shared_secret(
            &PrivateKey::from_hex(VIEWING_PRIV).unwrap(),
            &PublicKey::from_hex(EPHEMERAL_PUB).unwrap(),
        )
        .unwrap();
        assert_eq!(sender, receiver);
    }

    #[test]
    fn test_shared_secret_debug_redacted() {
        let a = generate_key_pair().unwrap();
        let b = generate_key_pair().unwrap();
        let secret = shared_secret(&a.private_key, &b.public_key).unwrap();
        assert_eq!(format!("{:?}", secret), "SharedSecret([REDACTED])");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_ecdh_symmetry(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let a = key_pair_from_private_key(PrivateKey::from_array(a));
            let b = key_pair_from_private_key(PrivateKey::from_array(b));
            prop_assume!(a.is_ok() && b.is_ok());
            let (a, b) = (a.unwrap(), b.unwrap());

            let ab = shared_secret(&a.private_key, &b.public_key).unwrap();
            let ba = shared_secret(&b.private_key, &a.public_key).unwrap();
            prop_assert_eq!(ab, ba);
        }
    }
}
