//! In-memory ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use shadow_core::error::{Result, ShadowError};
use shadow_core::traits::Ledger;
use shadow_core::types::{EthAddress, KeyPair};

/// Balances kept in a map, with sequential fake transaction hashes.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: DashMap<EthAddress, u128>,
    nonce: AtomicU64,
}

impl MemoryLedger {
    /// Creates a ledger with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `address` out of thin air. Saturates at `u128::MAX`.
    pub fn fund(&self, address: EthAddress, amount: u128) {
        let mut balance = self.balances.entry(address).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Number of transfers executed so far.
    pub fn transfer_count(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance(&self, address: EthAddress) -> Result<u128> {
        Ok(self.balances.get(&address).map_or(0, |b| *b))
    }

    #[instrument(skip(self, signer), fields(from = %signer.address))]
    async fn transfer(&self, signer: &KeyPair, to: EthAddress, amount: u128) -> Result<String> {
        // Checked before debiting so a rejected credit leaves both balances untouched
        if signer.address != to {
            let to_balance = self.balances.get(&to).map_or(0, |b| *b);
            if to_balance.checked_add(amount).is_none() {
                return Err(ShadowError::LedgerError(format!("balance of {to} would overflow")));
            }
        }

        {
            let mut from = self.balances.entry(signer.address).or_insert(0);
            if *from < amount {
                return Err(ShadowError::InsufficientFunds {
                    balance: *from,
                    required: amount,
                });
            }
            *from -= amount;
        }
        {
            let mut credit = self.balances.entry(to).or_insert(0);
            *credit = credit.saturating_add(amount);
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = format!("0x{nonce:064x}");
        debug!(tx_hash = %tx_hash, amount, "Transfer executed");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_core::types::{PrivateKey, PublicKey};

    fn signer(byte: u8) -> KeyPair {
        let mut pk = [byte; 33];
        pk[0] = 0x02;
        KeyPair::new(
            PrivateKey::from_array([byte; 32]),
            PublicKey::from_bytes(&pk).unwrap(),
            EthAddress::from_array([byte; 20]),
        )
    }

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let ledger = MemoryLedger::new();
        let alice = signer(1);
        let bob = EthAddress::from_array([2; 20]);
        ledger.fund(alice.address, 100);

        let tx = ledger.transfer(&alice, bob, 30).await.unwrap();
        assert_eq!(tx.len(), 66);
        assert_eq!(ledger.balance(alice.address).await.unwrap(), 70);
        assert_eq!(ledger.balance(bob).await.unwrap(), 30);
        assert_eq!(ledger.transfer_count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let ledger = MemoryLedger::new();
        let alice = signer(1);
        ledger.fund(alice.address, 10);

        let result = ledger.transfer(&alice, EthAddress::from_array([2; 20]), 11).await;
        assert!(matches!(
            result,
            Err(ShadowError::InsufficientFunds { balance: 10, required: 11 })
        ));
        assert_eq!(ledger.balance(alice.address).await.unwrap(), 10);
        assert_eq!(ledger.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_credit_overflow_rejected() {
        let ledger = MemoryLedger::new();
        let alice = signer(1);
        let whale = EthAddress::from_array([2; 20]);
        ledger.fund(alice.address, 10);
        ledger.fund(whale, u128::MAX - 5);

        let result = ledger.transfer(&alice, whale, 10).await;
        assert!(matches!(result, Err(ShadowError::LedgerError(_))));
        assert_eq!(ledger.balance(alice.address).await.unwrap(), 10);
        assert_eq!(ledger.balance(whale).await.unwrap(), u128::MAX - 5);
        assert_eq!(ledger.transfer_count(), 0);

        // Funding saturates instead of wrapping
        ledger.fund(whale, 100);
        assert_eq!(ledger.balance(whale).await.unwrap(), u128::MAX);
    }

    #[tokio::test]
    async fn test_self_transfer_and_unique_hashes() {
        let ledger = MemoryLedger::new();
        let alice = signer(1);
        ledger.fund(alice.address, 5);

        let a = ledger.transfer(&alice, alice.address, 5).await.unwrap();
        let b = ledger.transfer(&alice, alice.address, 5).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(ledger.balance(alice.address).await.unwrap(), 5);
    }
}
