//! Stealth payment creation (sender side).

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::{Announcer, Ledger, NameRegistry};
use shadow_core::types::{Announcement, EthAddress, KeyPair, PrivateKey, PublicKey, StealthMetaAddress};
use shadow_crypto::{
    compute_view_tag, decode_meta_address, derive_stealth_address, generate_key_pair,
    key_pair_from_private_key, shared_secret,
};

/// Stealth payment: address to send to and announcement to publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time address to send funds to
    pub stealth_address: EthAddress,
    /// Public half of the ephemeral key; its private half is already gone
    pub ephemeral_public_key: PublicKey,
    /// First byte of `keccak256(shared_secret)`
    pub view_tag: u8,
    /// The announcement to publish (scheme 1, metadata = `[view_tag]`)
    pub announcement: Announcement,
    /// Off-chain information about the payment
    pub metadata: PaymentMetadata,
}

/// Off-chain information about a stealth payment. Never announced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    /// Username the meta-address was resolved from
    pub recipient_username: Option<String>,
    /// Payment amount in wei (informational only)
    pub amount: Option<String>,
    /// Optional memo
    pub memo: Option<String>,
}

fn build_payment(
    meta_address: &StealthMetaAddress,
    ephemeral: &KeyPair,
    metadata: PaymentMetadata,
) -> Result<StealthPayment> {
    meta_address.validate()?;
    let (spending_pk, viewing_pk) = decode_meta_address(meta_address)?;

    let secret = shared_secret(&ephemeral.private_key, &viewing_pk)?;
    let view_tag = compute_view_tag(&secret);
    let stealth_address = derive_stealth_address(&spending_pk, &secret)?;

    let announcement = Announcement::with_view_tag(
        stealth_address,
        ephemeral.public_key.as_bytes().to_vec(),
        view_tag,
    );

    Ok(StealthPayment {
        stealth_address,
        ephemeral_public_key: ephemeral.public_key,
        view_tag,
        announcement,
        metadata,
    })
}

/// Creates a stealth payment with a fresh ephemeral key.
///
/// The ephemeral private key is zeroized before this function returns.
pub fn create_stealth_payment(meta_address: &StealthMetaAddress) -> Result<StealthPayment> {
    create_stealth_payment_with_metadata(meta_address, PaymentMetadata::default())
}

/// Creates a stealth payment carrying off-chain metadata.
pub fn create_stealth_payment_with_metadata(
    meta_address: &StealthMetaAddress,
    metadata: PaymentMetadata,
) -> Result<StealthPayment> {
    let ephemeral = generate_key_pair()?;
    build_payment(meta_address, &ephemeral, metadata)
}

/// Builder for stealth payments with optional metadata.
#[derive(Default)]
pub struct StealthPaymentBuilder {
    meta_address: Option<StealthMetaAddress>,
    recipient_username: Option<String>,
    amount: Option<String>,
    memo: Option<String>,
    ephemeral_key: Option<PrivateKey>,
}

impl StealthPaymentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient meta-address (required).
    pub fn recipient(mut self, meta_address: StealthMetaAddress) -> Self {
        self.meta_address = Some(meta_address);
        self
    }

    /// Records the username the meta-address came from.
    pub fn recipient_username(mut self, name: impl Into<String>) -> Self {
        self.recipient_username = Some(name.into());
        self
    }

    /// Records the amount.
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Attaches a memo.
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Uses a caller-supplied ephemeral private key instead of a random one.
    ///
    /// Only for reproducible tests; reusing an ephemeral key links payments.
    pub fn ephemeral_key(mut self, key: PrivateKey) -> Self {
        self.ephemeral_key = Some(key);
        self
    }

    /// Builds the payment.
    pub fn build(self) -> Result<StealthPayment> {
        let meta_address = self.meta_address.ok_or_else(|| {
            ShadowError::ValidationError("recipient meta-address is required".into())
        })?;

        let ephemeral = match self.ephemeral_key {
            Some(key) => key_pair_from_private_key(key)?,
            None => generate_key_pair()?,
        };

        let metadata = PaymentMetadata {
            recipient_username: self.recipient_username,
            amount: self.amount,
            memo: self.memo,
        };

        build_payment(&meta_address, &ephemeral, metadata)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENT FLOW
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of [`send_stealth_payment`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Hash of the value transfer
    pub tx_hash: String,
    /// Where the funds went
    pub stealth_address: EthAddress,
    /// The announcement for this payment, published or not
    pub announcement: Announcement,
    /// Announcer-assigned id; `None` if publishing failed
    pub announcement_id: Option<u64>,
}

impl PaymentReceipt {
    /// Returns true if the announcement was published.
    pub fn is_announced(&self) -> bool {
        self.announcement_id.is_some()
    }
}

/// Pays `amount` to a registered username via a fresh stealth address.
///
/// The flow is resolve, derive, transfer, then announce. A failed transfer
/// aborts before anything is announced. A failed announcement after a
/// successful transfer still yields a receipt (with `announcement_id = None`)
/// holding the announcement so it can be republished.
///
/// `signer` may be the master key pair or a recovered stealth key pair.
///
/// # Errors
/// `RecipientNotFound` if the username has no meta-address.
#[instrument(skip(registry, ledger, announcer, signer), fields(from = %signer.address))]
pub async fn send_stealth_payment(
    registry: &dyn NameRegistry,
    ledger: &dyn Ledger,
    announcer: &dyn Announcer,
    signer: &KeyPair,
    username: &str,
    amount: u128,
) -> Result<PaymentReceipt> {
    let meta_address = registry
        .resolve_username(username)
        .await?
        .ok_or_else(|| ShadowError::RecipientNotFound(username.to_string()))?;

    let payment = StealthPaymentBuilder::new()
        .recipient(meta_address)
        .recipient_username(username)
        .amount(amount.to_string())
        .build()?;
    debug!(stealth_address = %payment.stealth_address, view_tag = payment.view_tag, "Derived stealth address");

    let tx_hash = ledger.transfer(signer, payment.stealth_address, amount).await?;

    let mut announcement = payment.announcement;
    announcement.caller = Some(signer.address);
    announcement.transaction_hash = Some(tx_hash.clone());

    let announcement_id = match announcer.announce(announcement.clone()).await {
        Ok(id) => {
            announcement.id = id;
            info!(id, tx_hash = %tx_hash, "Stealth payment sent and announced");
            Some(id)
        }
        Err(e) => {
            warn!(error = %e, tx_hash = %tx_hash, "Transfer succeeded but announcement failed");
            None
        }
    };

    Ok(PaymentReceipt {
        tx_hash,
        stealth_address: payment.stealth_address,
        announcement,
        announcement_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{recover_stealth_key_pair, scan_announcement};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use shadow_core::types::BlockRange;
    use shadow_crypto::{derive_keys, wallet_meta_address};
    use shadow_registry::{MemoryLedger, MemoryRegistry};

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn recipient_meta() -> StealthMetaAddress {
        wallet_meta_address(&derive_keys(MNEMONIC).unwrap())
    }

    #[test]
    fn test_builder_vector() {
        let payment = StealthPaymentBuilder::new()
            .recipient(recipient_meta())
            .ephemeral_key(PrivateKey::from_array([0x01; 32]))
            .build()
            .unwrap();

        assert_eq!(
            payment.stealth_address.to_checksum_string(),
            "0xC95659C38C4A3C90c3cBEc303F056C11ee717104"
        );
        assert_eq!(
            payment.ephemeral_public_key.to_hex(),
            "031b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f"
        );
        assert_eq!(payment.view_tag, 19);
        assert_eq!(payment.announcement.metadata, vec![19]);
        assert_eq!(payment.announcement.scheme_id, 1);
        assert!(payment.announcement.validate().is_ok());
    }

    #[test]
    fn test_fresh_ephemeral_key_per_payment() {
        let meta = recipient_meta();
        let a = create_stealth_payment(&meta).unwrap();
        let b = create_stealth_payment(&meta).unwrap();

        assert_ne!(a.stealth_address, b.stealth_address);
        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
    }

    #[test]
    fn test_recipient_discovers_payment() {
        let keys = derive_keys(MNEMONIC).unwrap();
        let payment = create_stealth_payment(&wallet_meta_address(&keys)).unwrap();

        let owned = scan_announcement(
            &payment.announcement,
            &keys.viewing.private_key,
            &keys.spending.public_key,
        )
        .into_owned()
        .unwrap();
        let pair =
            recover_stealth_key_pair(&keys.spending.private_key, &keys.viewing.private_key, &owned)
                .unwrap();
        assert_eq!(pair.address, payment.stealth_address);
    }

    #[test]
    fn test_builder_metadata() {
        let payment = StealthPaymentBuilder::new()
            .recipient(recipient_meta())
            .recipient_username("bob")
            .amount("1000")
            .memo("rent")
            .build()
            .unwrap();

        assert_eq!(payment.metadata.recipient_username.as_deref(), Some("bob"));
        assert_eq!(payment.metadata.amount.as_deref(), Some("1000"));
        assert_eq!(payment.metadata.memo.as_deref(), Some("rent"));
        // Metadata stays off-chain
        assert_eq!(payment.announcement.metadata.len(), 1);
    }

    #[test]
    fn test_builder_missing_recipient() {
        assert!(matches!(
            StealthPaymentBuilder::new().amount("1").build(),
            Err(ShadowError::ValidationError(_))
        ));
    }

    #[test]
    fn test_identical_meta_keys_rejected() {
        let keys = derive_keys(MNEMONIC).unwrap();
        let meta = StealthMetaAddress::new(keys.spending.public_key, keys.spending.public_key);
        assert!(create_stealth_payment(&meta).is_err());
    }

    #[test]
    fn test_payment_serialization() {
        let payment = create_stealth_payment(&recipient_meta()).unwrap();
        let json = serde_json::to_string(&payment).unwrap();
        let restored: StealthPayment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.stealth_address, payment.stealth_address);
        assert_eq!(restored.announcement, payment.announcement);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PAYMENT FLOW
    // ═══════════════════════════════════════════════════════════════════════════

    struct FailingAnnouncer;

    #[async_trait]
    impl Announcer for FailingAnnouncer {
        async fn announce(&self, _announcement: Announcement) -> Result<u64> {
            Err(ShadowError::AnnouncerError("announcer offline".into()))
        }

        async fn announcements(&self, _range: BlockRange) -> Result<Vec<Announcement>> {
            Ok(Vec::new())
        }

        async fn latest_block(&self) -> Result<u64> {
            Ok(0)
        }
    }

    async fn setup() -> (MemoryRegistry, MemoryLedger, KeyPair) {
        let registry = MemoryRegistry::new();
        let recipient = derive_keys(MNEMONIC).unwrap();
        registry
            .register_username(recipient.master.address, "bob", wallet_meta_address(&recipient))
            .await
            .unwrap();

        let sender = shadow_crypto::generate_key_pair().unwrap();
        let ledger = MemoryLedger::new();
        ledger.fund(sender.address, 1_000);
        (registry, ledger, sender)
    }

    #[tokio::test]
    async fn test_send_stealth_payment() {
        let (registry, ledger, sender) = setup().await;

        let receipt = send_stealth_payment(&registry, &ledger, &registry, &sender, "bob", 400)
            .await
            .unwrap();

        assert!(receipt.is_announced());
        assert_eq!(ledger.balance(receipt.stealth_address).await.unwrap(), 400);
        assert_eq!(ledger.balance(sender.address).await.unwrap(), 600);

        let log = registry.announcements(BlockRange::all()).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].stealth_address, receipt.stealth_address);
        assert_eq!(log[0].caller, Some(sender.address));
        assert_eq!(log[0].transaction_hash.as_deref(), Some(receipt.tx_hash.as_str()));
    }

    #[tokio::test]
    async fn test_send_to_unknown_username() {
        let (registry, ledger, sender) = setup().await;

        let result = send_stealth_payment(&registry, &ledger, &registry, &sender, "carol", 1).await;
        assert!(matches!(result, Err(ShadowError::RecipientNotFound(_))));
        assert_eq!(ledger.balance(sender.address).await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_failed_transfer_announces_nothing() {
        let (registry, ledger, sender) = setup().await;

        let result =
            send_stealth_payment(&registry, &ledger, &registry, &sender, "bob", 5_000).await;
        assert!(matches!(result, Err(ShadowError::InsufficientFunds { .. })));
        assert!(registry.announcements(BlockRange::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_announcement_still_returns_receipt() {
        let (registry, ledger, sender) = setup().await;

        let receipt =
            send_stealth_payment(&registry, &ledger, &FailingAnnouncer, &sender, "bob", 10)
                .await
                .unwrap();

        assert!(!receipt.is_announced());
        assert_eq!(ledger.balance(receipt.stealth_address).await.unwrap(), 10);
        // Republishing the carried announcement succeeds
        let id = registry.announce(receipt.announcement.clone()).await.unwrap();
        assert_eq!(registry.announcements(BlockRange::all()).await.unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn test_spend_from_stealth_address() {
        let (registry, ledger, sender) = setup().await;
        let recipient = derive_keys(MNEMONIC).unwrap();

        let receipt = send_stealth_payment(&registry, &ledger, &registry, &sender, "bob", 300)
            .await
            .unwrap();
        let owned = scan_announcement(
            &receipt.announcement,
            &recipient.viewing.private_key,
            &recipient.spending.public_key,
        )
        .into_owned()
        .unwrap();
        let stealth_signer = recover_stealth_key_pair(
            &recipient.spending.private_key,
            &recipient.viewing.private_key,
            &owned,
        )
        .unwrap();

        // The recovered key can pay onwards like any other signer
        let onward =
            send_stealth_payment(&registry, &ledger, &registry, &stealth_signer, "bob", 300)
                .await
                .unwrap();
        assert_eq!(ledger.balance(owned.stealth_address).await.unwrap(), 0);
        assert_eq!(ledger.balance(onward.stealth_address).await.unwrap(), 300);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_any_ephemeral_key_is_recoverable(ephemeral in any::<[u8; 32]>()) {
            let keys = derive_keys(MNEMONIC).unwrap();
            let built = StealthPaymentBuilder::new()
                .recipient(wallet_meta_address(&keys))
                .ephemeral_key(PrivateKey::from_array(ephemeral))
                .build();
            prop_assume!(built.is_ok());
            let payment = built.unwrap();

            let owned = scan_announcement(
                &payment.announcement,
                &keys.viewing.private_key,
                &keys.spending.public_key,
            )
            .into_owned();
            prop_assert!(owned.is_some());

            let stealth = recover_stealth_key_pair(
                &keys.spending.private_key,
                &keys.viewing.private_key,
                &owned.unwrap(),
            )
            .unwrap();
            prop_assert_eq!(stealth.address, payment.stealth_address);
        }
    }
}
