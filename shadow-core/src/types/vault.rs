//! Encrypted seed vault.

use serde::{Deserialize, Serialize};

use crate::constants::{AES_BLOCK_SIZE, VAULT_IV_SIZE, VAULT_SALT_SIZE};

/// The password-encrypted seed phrase, the only persisted secret-derived record.
///
/// Each field is stored as lowercase hex. A vault is never modified in place;
/// changing the password produces a new vault that replaces this one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVault {
    /// AES-256-CBC ciphertext of the UTF-8 seed phrase (PKCS#7 padded)
    #[serde(with = "hex")]
    pub ciphertext: Vec<u8>,
    /// PBKDF2 salt, fresh per vault
    #[serde(with = "hex")]
    pub salt: [u8; VAULT_SALT_SIZE],
    /// CBC initialization vector, fresh per vault
    #[serde(with = "hex")]
    pub iv: [u8; VAULT_IV_SIZE],
}

impl EncryptedVault {
    /// Returns true if the ciphertext has a length AES-CBC could have produced.
    pub fn is_well_formed(&self) -> bool {
        !self.ciphertext.is_empty() && self.ciphertext.len() % AES_BLOCK_SIZE == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_json_is_lowercase_hex() {
        let vault = EncryptedVault {
            ciphertext: vec![0xAB; 32],
            salt: [0x0F; 16],
            iv: [0xC0; 16],
        };
        let json = serde_json::to_value(&vault).unwrap();
        assert_eq!(json["ciphertext"], "ab".repeat(32));
        assert_eq!(json["salt"], "0f".repeat(16));
        assert_eq!(json["iv"], "c0".repeat(16));

        let back: EncryptedVault = serde_json::from_value(json).unwrap();
        assert_eq!(back, vault);
    }

    #[test]
    fn test_vault_rejects_short_salt() {
        let json = r#"{"ciphertext":"00","salt":"0011","iv":"00000000000000000000000000000000"}"#;
        assert!(serde_json::from_str::<EncryptedVault>(json).is_err());
    }

    #[test]
    fn test_vault_well_formed() {
        let mut vault = EncryptedVault {
            ciphertext: vec![0; 16],
            salt: [0; 16],
            iv: [0; 16],
        };
        assert!(vault.is_well_formed());
        vault.ciphertext.pop();
        assert!(!vault.is_well_formed());
        vault.ciphertext.clear();
        assert!(!vault.is_well_formed());
    }
}
