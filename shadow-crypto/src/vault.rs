//! Password-based encryption of the seed phrase at rest.
//!
//! ```text
//! key        = PBKDF2-HMAC-SHA256(password, salt, 10_000 iterations, 32 bytes)
//! ciphertext = AES-256-CBC(key, iv, PKCS#7(seed_phrase))
//! ```
//!
//! Salt and IV are fresh per vault. Every failure to open a vault is reported
//! as `InvalidPassword`, whatever the underlying cause.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use shadow_core::constants::{PBKDF2_ITERATIONS, VAULT_IV_SIZE, VAULT_KEY_SIZE, VAULT_SALT_SIZE};
use shadow_core::error::{Result, ShadowError};
use shadow_core::types::EncryptedVault;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Stretches a password into an AES-256 key.
///
/// Deterministic for a fixed `(password, salt)`; each vault has its own salt.
pub fn stretch(password: &str, salt: &[u8]) -> Zeroizing<[u8; VAULT_KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; VAULT_KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut *key);
    key
}

/// Encrypts a seed phrase under a password with a fresh salt and IV.
pub fn seal(seed: &str, password: &str) -> Result<EncryptedVault> {
    let mut salt = [0u8; VAULT_SALT_SIZE];
    let mut iv = [0u8; VAULT_IV_SIZE];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    seal_with(seed, password, salt, iv)
}

/// Encrypts with caller-supplied salt and IV.
///
/// Reusing a salt/IV pair across vaults defeats both; prefer [`seal`].
pub fn seal_with(
    seed: &str,
    password: &str,
    salt: [u8; VAULT_SALT_SIZE],
    iv: [u8; VAULT_IV_SIZE],
) -> Result<EncryptedVault> {
    if seed.is_empty() {
        return Err(ShadowError::ValidationError("seed phrase is empty".into()));
    }

    let key = stretch(password, &salt);
    let cipher = Aes256CbcEnc::new_from_slices(&*key, &iv)
        .map_err(|e| ShadowError::EncryptionError(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(seed.as_bytes());

    Ok(EncryptedVault {
        ciphertext,
        salt,
        iv,
    })
}

/// Decrypts a vault.
///
/// # Errors
/// `InvalidPassword` for a wrong password, a malformed ciphertext, bad
/// padding, non-UTF-8 plaintext or an empty plaintext.
pub fn open(vault: &EncryptedVault, password: &str) -> Result<Zeroizing<String>> {
    if !vault.is_well_formed() {
        return Err(ShadowError::InvalidPassword);
    }

    let key = stretch(password, &vault.salt);
    let cipher =
        Aes256CbcDec::new_from_slices(&*key, &vault.iv).map_err(|_| ShadowError::InvalidPassword)?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&vault.ciphertext)
            .map_err(|_| ShadowError::InvalidPassword)?,
    );

    let seed = std::str::from_utf8(&plaintext).map_err(|_| ShadowError::InvalidPassword)?;
    if seed.is_empty() {
        return Err(ShadowError::InvalidPassword);
    }

    Ok(Zeroizing::new(seed.to_owned()))
}

/// Re-encrypts a vault under a new password with a fresh salt and IV.
///
/// The old vault is left untouched; the caller replaces it in storage.
pub fn reseal(vault: &EncryptedVault, old_password: &str, new_password: &str) -> Result<EncryptedVault> {
    let seed = open(vault, old_password)?;
    seal(&seed, new_password)
}
