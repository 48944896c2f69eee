//! Error types for SHADOW.
//!
//! This module provides a single error hierarchy using `thiserror`.
//! Authentication failures (`InvalidPassword`, `InvalidMnemonic`) are kept
//! distinct from "nothing found" outcomes so callers never confuse the two.

use thiserror::Error;

/// Result type alias using `ShadowError`.
pub type Result<T> = std::result::Result<T, ShadowError>;

/// Main error type for all SHADOW operations.
#[derive(Debug, Error)]
pub enum ShadowError {
    // ═══════════════════════════════════════════════════════════════════════════
    // AUTHENTICATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Vault could not be opened with the supplied password.
    ///
    /// Padding failures, garbage plaintext and empty plaintext all map here.
    #[error("Invalid password or corrupted vault")]
    InvalidPassword,

    /// Seed phrase failed word-list or checksum validation.
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid key size or format.
    #[error("Invalid key: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Bytes do not encode a valid secp256k1 point.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Scalar is zero or not below the curve order.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Tweak reduced to zero, the stealth point is the identity, or the
    /// stealth scalar is zero.
    #[error("Degenerate stealth tweak")]
    DegenerateTweak,

    /// Derived stealth private key does not control the expected address.
    #[error("Stealth key mismatch: derived {derived}, expected {expected}")]
    StealthKeyMismatch {
        /// Address controlled by the derived key
        derived: String,
        /// Address the key was derived for
        expected: String,
    },

    /// Hierarchical key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    /// Symmetric encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid meta-address format or content.
    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No meta-address registered for a username.
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    /// Malformed or unexpected announcement record.
    #[error("Announcement parse error: {0}")]
    AnnouncementParseError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY & ANNOUNCER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Username already registered.
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Name registry failure.
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Announcer failure.
    #[error("Announcer error: {0}")]
    AnnouncerError(String),

    /// Duplicate announcement for a transaction.
    #[error("Duplicate announcement for transaction {0}")]
    DuplicateAnnouncement(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LEDGER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Signer balance cannot cover the transfer.
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Available balance in wei
        balance: u128,
        /// Requested amount in wei
        required: u128,
    },

    /// Ledger failure.
    #[error("Ledger error: {0}")]
    LedgerError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No vault stored yet.
    #[error("No wallet vault found")]
    VaultNotFound,

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ShadowError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShadowError::RegistryError(_)
                | ShadowError::AnnouncerError(_)
                | ShadowError::LedgerError(_)
                | ShadowError::IoError(_)
        )
    }

    /// Returns true if the caller supplied the wrong secret.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ShadowError::InvalidPassword | ShadowError::InvalidMnemonic(_)
        )
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            ShadowError::InvalidKeySize { .. }
                | ShadowError::InvalidPublicKey(_)
                | ShadowError::InvalidPrivateKey(_)
                | ShadowError::DegenerateTweak
                | ShadowError::StealthKeyMismatch { .. }
                | ShadowError::KeyDerivationError(_)
                | ShadowError::EncryptionError(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ShadowError::ValidationError(_)
                | ShadowError::InvalidMetaAddress(_)
                | ShadowError::InvalidAddress(_)
                | ShadowError::AnnouncementParseError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShadowError::InvalidKeySize {
            expected: 33,
            actual: 65,
        };
        assert!(err.to_string().contains("33"));
        assert!(err.to_string().contains("65"));
    }

    #[test]
    fn test_invalid_password_message_is_uniform() {
        assert_eq!(
            ShadowError::InvalidPassword.to_string(),
            "Invalid password or corrupted vault"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(ShadowError::AnnouncerError("test".into()).is_recoverable());
        assert!(ShadowError::LedgerError("test".into()).is_recoverable());
        assert!(!ShadowError::InvalidPassword.is_recoverable());

        assert!(ShadowError::InvalidPassword.is_auth_error());
        assert!(ShadowError::InvalidMnemonic("checksum".into()).is_auth_error());
        assert!(!ShadowError::RecipientNotFound("bob".into()).is_auth_error());

        assert!(ShadowError::DegenerateTweak.is_crypto_error());
        assert!(!ShadowError::AnnouncerError("test".into()).is_crypto_error());

        assert!(ShadowError::AnnouncementParseError("bad key".into()).is_validation_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let shadow_result: Result<serde_json::Value> = json_result.map_err(ShadowError::from);
        assert!(matches!(shadow_result, Err(ShadowError::JsonError(_))));
    }
}
