//! SHADOW wallet implementation.
//!
//! The wallet holds the key pairs derived from one seed phrase for as long as
//! it is alive. Nothing secret is persisted except the encrypted vault; the
//! keys are rebuilt from it every time a password is supplied.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::{NameRegistry, VaultStore};
use shadow_core::types::{
    Announcement, EncryptedVault, EthAddress, KeyPair, OwnedStealthAddress, PrivateKey, PublicKey,
    StealthMetaAddress, WalletKeyPairs,
};
use shadow_crypto::{derive_keys, generate_mnemonic, open, reseal, seal, wallet_meta_address};

use crate::discovery::{recover_stealth_key_pair, try_recover_stealth_address};

/// A SHADOW wallet unlocked for the duration of one operation.
///
/// The wallet holds:
/// - Master key: owns the username and the main account
/// - Spending key: controls every stealth address
/// - Viewing key: finds incoming payments (can be exported for watch-only scanning)
#[derive(ZeroizeOnDrop)]
pub struct ShadowWallet {
    keys: WalletKeyPairs,
    #[zeroize(skip)]
    meta_address: StealthMetaAddress,
}

impl ShadowWallet {
    /// Decrypts a vault and derives the wallet keys.
    ///
    /// The decrypted seed phrase is dropped (and zeroized) before this returns.
    ///
    /// # Errors
    /// `InvalidPassword` for a wrong password or a corrupted vault.
    pub fn unlock(vault: &EncryptedVault, password: &str) -> Result<Self> {
        let seed = open(vault, password)?;
        Self::from_mnemonic(&seed)
    }

    /// Loads the vault from storage and unlocks it.
    ///
    /// # Errors
    /// `VaultNotFound` if nothing is stored yet.
    pub async fn unlock_from(store: &dyn VaultStore, password: &str) -> Result<Self> {
        let vault = store.load().await?.ok_or(ShadowError::VaultNotFound)?;
        Self::unlock(&vault, password)
    }

    /// Derives the wallet keys from a seed phrase.
    pub fn from_mnemonic(seed_phrase: &str) -> Result<Self> {
        Ok(Self::from_keys(derive_keys(seed_phrase)?))
    }

    /// Wraps an already derived key set.
    pub fn from_keys(keys: WalletKeyPairs) -> Self {
        let meta_address = wallet_meta_address(&keys);
        Self { keys, meta_address }
    }

    /// Returns the meta-address for publishing.
    pub fn meta_address(&self) -> &StealthMetaAddress {
        &self.meta_address
    }

    /// Master key pair; the signer for payments from the main account.
    pub fn master(&self) -> &KeyPair {
        &self.keys.master
    }

    /// Address of the master key.
    pub fn master_address(&self) -> EthAddress {
        self.keys.master.address
    }

    /// Spending key pair.
    pub fn spending(&self) -> &KeyPair {
        &self.keys.spending
    }

    /// Viewing key pair.
    pub fn viewing(&self) -> &KeyPair {
        &self.keys.viewing
    }

    /// Checks a single announcement against this wallet.
    ///
    /// `Ok(None)` if the announcement is someone else's.
    pub fn try_recover(&self, announcement: &Announcement) -> Result<Option<EthAddress>> {
        try_recover_stealth_address(
            &self.keys.viewing.private_key,
            &self.keys.spending.public_key,
            announcement,
        )
    }

    /// Derives the key pair controlling an owned stealth address.
    ///
    /// # Errors
    /// `StealthKeyMismatch` if the derived key does not control the address.
    pub fn stealth_key_pair(&self, owned: &OwnedStealthAddress) -> Result<KeyPair> {
        recover_stealth_key_pair(
            &self.keys.spending.private_key,
            &self.keys.viewing.private_key,
            owned,
        )
    }

    /// Registers `name` for this wallet's meta-address, owned by the master address.
    ///
    /// # Errors
    /// `UsernameTaken` if the name is already registered.
    #[instrument(skip(self, registry), fields(owner = %self.keys.master.address))]
    pub async fn register_username(&self, registry: &dyn NameRegistry, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShadowError::ValidationError("username is empty".into()));
        }

        if registry.username_exists(name).await? {
            return Err(ShadowError::UsernameTaken(name.to_string()));
        }

        registry
            .register_username(self.keys.master.address, name, self.meta_address)
            .await?;
        info!(name, "Username registered");
        Ok(())
    }

    /// Exports what a watch-only scanner needs: the viewing private key and
    /// the spending public key. The export cannot spend.
    pub fn export_viewing_key(&self) -> ViewingKeyExport {
        ViewingKeyExport {
            viewing_private_key: self.keys.viewing.private_key.to_hex(),
            spending_public_key: self.keys.spending.public_key,
        }
    }
}

impl std::fmt::Debug for ShadowWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowWallet")
            .field("meta_address", &self.meta_address)
            .field("master_address", &self.keys.master.address)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Watch-only scanning keys.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ViewingKeyExport {
    /// Viewing private key (hex)
    pub viewing_private_key: String,
    /// Spending public key
    #[zeroize(skip)]
    pub spending_public_key: PublicKey,
}

impl ViewingKeyExport {
    /// Parses the exported keys back into scanner inputs.
    pub fn keys(&self) -> Result<(PrivateKey, PublicKey)> {
        Ok((
            PrivateKey::from_hex(&self.viewing_private_key)?,
            self.spending_public_key,
        ))
    }
}

impl std::fmt::Debug for ViewingKeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKeyExport")
            .field("spending_public_key", &self.spending_public_key)
            .field("viewing_private_key", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates a new seed phrase and seals it under `password`.
///
/// The phrase is returned once so the user can write it down; only the
/// vault should be stored.
pub fn create_wallet(
    password: &str,
    word_count: usize,
) -> Result<(Zeroizing<String>, EncryptedVault)> {
    let phrase = generate_mnemonic(word_count)?;
    let vault = seal(&phrase, password)?;
    debug!(word_count, "Created wallet vault");
    Ok((phrase, vault))
}

/// Validates an existing seed phrase and seals it under `password`.
///
/// The phrase is normalized (lowercase, single spaces) before sealing.
///
/// # Errors
/// `InvalidMnemonic` if the phrase fails word-list or checksum validation.
pub fn import_wallet(seed_phrase: &str, password: &str) -> Result<EncryptedVault> {
    let normalized = Zeroizing::new(
        seed_phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" "),
    );

    // Derivation validates the phrase and catches anything unusable before it is stored
    derive_keys(&normalized)?;
    seal(&normalized, password)
}

/// Re-encrypts the vault under a new password.
///
/// # Errors
/// `InvalidPassword` if `old_password` does not open the vault.
pub fn change_password(
    vault: &EncryptedVault,
    old_password: &str,
    new_password: &str,
) -> Result<EncryptedVault> {
    reseal(vault, old_password, new_password)
}
