//! # SHADOW Stealth Address Protocol
//!
//! High-level API for creating and discovering stealth payments.
//!
//! This crate provides:
//!
//! - **Wallet**: Create, import and unlock password-protected wallets
//! - **Payments**: Derive one-time addresses and run the transfer-then-announce flow
//! - **Discovery**: Recognize announcements addressed to this wallet and recover their keys
//!
//! ## Quick Start
//!
//! ```rust
//! use shadow_stealth::{create_stealth_payment, import_wallet, ShadowWallet};
//!
//! let phrase = "abandon abandon abandon abandon abandon abandon \
//!               abandon abandon abandon abandon abandon about";
//! let vault = import_wallet(phrase, "hunter2").unwrap();
//!
//! // Recipient: unlock and publish the meta-address
//! let wallet = ShadowWallet::unlock(&vault, "hunter2").unwrap();
//! let meta_address = *wallet.meta_address();
//!
//! // Sender: derive a one-time address and an announcement
//! let payment = create_stealth_payment(&meta_address).unwrap();
//!
//! // Recipient: recognize the announcement
//! let found = wallet.try_recover(&payment.announcement).unwrap();
//! assert_eq!(found, Some(payment.stealth_address));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod discovery;
pub mod payment;
pub mod wallet;

pub use discovery::{
    recover_stealth_key_pair, scan_announcement, scan_announcements, try_recover_stealth_address,
    ScanResult, ScanStats,
};
pub use payment::{
    create_stealth_payment, create_stealth_payment_with_metadata, send_stealth_payment,
    PaymentMetadata, PaymentReceipt, StealthPayment, StealthPaymentBuilder,
};
pub use wallet::{change_password, create_wallet, import_wallet, ShadowWallet, ViewingKeyExport};
