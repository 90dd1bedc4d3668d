//! In-memory reference implementations of the collaborator traits.
//!
//! Used by the integration tests and by embedders that want the engine
//! without a database. Each wallet lives in its own `DashMap` entry, so a
//! mutation holds exactly one entry lock: overdraft checks happen under the
//! same lock that reads the balance, transfers over disjoint wallets run in
//! parallel, and transfers sharing a wallet serialize on its entry.
//!
//! The store never holds two entry locks at once, which trivially satisfies
//! the stable-acquisition-order requirement of the engine contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use uuid::Uuid;

use super::error::StoreError;
use super::spi::{
    ListenerError, TransactionManager, WalletListener, WalletManager, WalletOwnerManager,
};
use super::types::{TransactionId, TransactionRecord};
use crate::money::{Amount, Currency};
use crate::wallet::{Wallet, WalletOwner};

struct StoredWallet {
    owner: WalletOwner,
    balance: Decimal,
    currency: Currency,
    wallet_type: String,
    version: u64,
}

/// In-memory wallet store implementing both [`WalletManager`] and
/// [`WalletOwnerManager`].
///
/// Owner-level policy combines the owner flags with an optional per-owner
/// withdraw cap, making the gate amount-dependent. Wallet-level policy
/// denies frozen wallets and withdrawals beyond the current balance.
#[derive(Default)]
pub struct InMemoryWalletStore {
    wallets: DashMap<u64, StoredWallet>,
    frozen: DashMap<u64, ()>,
    withdraw_caps: DashMap<Uuid, Decimal>,
    /// Pending injected version conflicts, consumed one per mutation
    inject_conflicts: AtomicU32,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_wallet(&self, wallet: Wallet) {
        let balance = wallet.balance().value();
        self.wallets.insert(
            wallet.id,
            StoredWallet {
                owner: wallet.owner,
                balance,
                currency: wallet.currency,
                wallet_type: wallet.wallet_type,
                version: 0,
            },
        );
    }

    /// Current balance, or `None` for an unknown wallet
    pub fn balance_of(&self, id: u64) -> Option<Decimal> {
        self.wallets.get(&id).map(|w| w.balance)
    }

    pub fn version_of(&self, id: u64) -> Option<u64> {
        self.wallets.get(&id).map(|w| w.version)
    }

    /// Freeze a wallet: both wallet-level gates deny it afterwards
    pub fn freeze(&self, id: u64) {
        self.frozen.insert(id, ());
    }

    /// Tiered owner limit: withdrawals above `cap` are denied for the owner
    pub fn set_withdraw_cap(&self, owner: Uuid, cap: Decimal) {
        self.withdraw_caps.insert(owner, cap);
    }

    /// Make the next `n` mutations fail with a version conflict
    pub fn inject_conflicts(&self, n: u32) {
        self.inject_conflicts.store(n, Ordering::SeqCst);
    }

    fn take_conflict(&self) -> Result<(), StoreError> {
        let pending = self.inject_conflicts.load(Ordering::SeqCst);
        if pending > 0
            && self
                .inject_conflicts
                .compare_exchange(pending, pending - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(StoreError::VersionConflict);
        }
        Ok(())
    }

    fn snapshot(&self, id: u64) -> Result<Option<Wallet>, StoreError> {
        let Some(stored) = self.wallets.get(&id) else {
            return Ok(None);
        };
        let balance = Amount::new(stored.currency.clone(), stored.balance)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let wallet = Wallet::new(
            id,
            stored.owner.clone(),
            balance,
            stored.currency.clone(),
            stored.wallet_type.clone(),
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(wallet))
    }
}

#[async_trait]
impl WalletManager for InMemoryWalletStore {
    async fn find_wallet_by_id(&self, id: u64) -> Result<Option<Wallet>, StoreError> {
        self.snapshot(id)
    }

    async fn is_withdraw_allowed(
        &self,
        wallet: &Wallet,
        quantity: Decimal,
    ) -> Result<bool, StoreError> {
        let stored = self
            .wallets
            .get(&wallet.id)
            .ok_or(StoreError::WalletNotFound(wallet.id))?;
        Ok(!self.frozen.contains_key(&wallet.id) && stored.balance >= quantity)
    }

    async fn is_deposit_allowed(
        &self,
        wallet: &Wallet,
        _quantity: Decimal,
    ) -> Result<bool, StoreError> {
        if !self.wallets.contains_key(&wallet.id) {
            return Err(StoreError::WalletNotFound(wallet.id));
        }
        Ok(!self.frozen.contains_key(&wallet.id))
    }

    async fn decrease_balance(
        &self,
        wallet: &Wallet,
        quantity: Decimal,
    ) -> Result<(), StoreError> {
        self.take_conflict()?;
        // Entry lock is the atomic section: the overdraft check reads the
        // balance under the same lock that mutates it.
        let mut stored = self
            .wallets
            .get_mut(&wallet.id)
            .ok_or(StoreError::WalletNotFound(wallet.id))?;
        if stored.balance < quantity {
            return Err(StoreError::InsufficientBalance);
        }
        stored.balance -= quantity;
        stored.version += 1;
        Ok(())
    }

    async fn increase_balance(
        &self,
        wallet: &Wallet,
        quantity: Decimal,
    ) -> Result<(), StoreError> {
        self.take_conflict()?;
        let mut stored = self
            .wallets
            .get_mut(&wallet.id)
            .ok_or(StoreError::WalletNotFound(wallet.id))?;
        stored.balance = stored
            .balance
            .checked_add(quantity)
            .ok_or_else(|| StoreError::Backend("balance overflow".to_string()))?;
        stored.version += 1;
        Ok(())
    }
}

#[async_trait]
impl WalletOwnerManager for InMemoryWalletStore {
    async fn is_withdraw_allowed(
        &self,
        owner: &WalletOwner,
        amount: &Amount,
    ) -> Result<bool, StoreError> {
        if !owner.is_withdraw_allowed {
            return Ok(false);
        }
        match self.withdraw_caps.get(&owner.uuid) {
            Some(cap) => Ok(amount.value() <= *cap),
            None => Ok(true),
        }
    }

    async fn is_deposit_allowed(
        &self,
        owner: &WalletOwner,
        _amount: &Amount,
    ) -> Result<bool, StoreError> {
        Ok(owner.is_deposit_allowed)
    }
}

/// Append-only in-memory transaction log.
#[derive(Default)]
pub struct InMemoryTransactionLog {
    records: Mutex<Vec<(TransactionId, TransactionRecord)>>,
    fail_next: AtomicBool,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<(TransactionId, TransactionRecord)> {
        self.records.lock().unwrap().clone()
    }

    /// Make the next save fail, for the recording-failure path
    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionLog {
    async fn save(&self, record: &TransactionRecord) -> Result<TransactionId, StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("transaction log unavailable".into()));
        }
        let id = TransactionId::new();
        self.records.lock().unwrap().push((id, record.clone()));
        Ok(id)
    }
}

/// Listener that records every callback, for observer assertions.
#[derive(Default)]
pub struct RecordingListener {
    withdraws: Mutex<Vec<(Uuid, u64, Decimal, TransactionId)>>,
    deposits: Mutex<Vec<(Uuid, u64, Decimal, TransactionId)>>,
    fail: AtomicBool,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn withdraw_count(&self) -> usize {
        self.withdraws.lock().unwrap().len()
    }

    pub fn deposit_count(&self) -> usize {
        self.deposits.lock().unwrap().len()
    }

    pub fn withdraws(&self) -> Vec<(Uuid, u64, Decimal, TransactionId)> {
        self.withdraws.lock().unwrap().clone()
    }

    pub fn deposits(&self) -> Vec<(Uuid, u64, Decimal, TransactionId)> {
        self.deposits.lock().unwrap().clone()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletListener for RecordingListener {
    async fn on_withdraw(
        &self,
        owner: &WalletOwner,
        wallet: &Wallet,
        amount: &Amount,
        transaction_id: &TransactionId,
        _at: DateTime<Utc>,
    ) -> Result<(), ListenerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ListenerError("listener unavailable".into()));
        }
        self.withdraws.lock().unwrap().push((
            owner.uuid,
            wallet.id,
            amount.value(),
            *transaction_id,
        ));
        Ok(())
    }

    async fn on_deposit(
        &self,
        owner: &WalletOwner,
        wallet: &Wallet,
        amount: &Amount,
        _counterparty: &WalletOwner,
        transaction_id: &TransactionId,
        _at: DateTime<Utc>,
    ) -> Result<(), ListenerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ListenerError("listener unavailable".into()));
        }
        self.deposits.lock().unwrap().push((
            owner.uuid,
            wallet.id,
            amount.value(),
            *transaction_id,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eth() -> Currency {
        Currency::new("ETH", "Ethereum", 4)
    }

    fn seed(store: &InMemoryWalletStore, id: u64, balance: Decimal) -> Wallet {
        let owner = WalletOwner {
            id,
            uuid: Uuid::new_v4(),
            owner_type: "wallet".to_string(),
            level: "1".to_string(),
            is_trade_allowed: true,
            is_withdraw_allowed: true,
            is_deposit_allowed: true,
        };
        let wallet = Wallet::new(
            id,
            owner,
            Amount::new(eth(), balance).unwrap(),
            eth(),
            "main",
        )
        .unwrap();
        store.insert_wallet(wallet.clone());
        wallet
    }

    #[tokio::test]
    async fn test_overdraft_detected_under_entry_lock() {
        let store = InMemoryWalletStore::new();
        let wallet = seed(&store, 1, dec!(1.0));

        let err = store.decrease_balance(&wallet, dec!(1.5)).await.unwrap_err();
        assert_eq!(err, StoreError::InsufficientBalance);
        assert_eq!(store.balance_of(1), Some(dec!(1.0)));
        assert_eq!(store.version_of(1), Some(0));
    }

    #[tokio::test]
    async fn test_mutations_bump_version() {
        let store = InMemoryWalletStore::new();
        let wallet = seed(&store, 1, dec!(2.0));

        store.decrease_balance(&wallet, dec!(0.5)).await.unwrap();
        store.increase_balance(&wallet, dec!(1.0)).await.unwrap();

        assert_eq!(store.balance_of(1), Some(dec!(2.5)));
        assert_eq!(store.version_of(1), Some(2));
    }

    #[tokio::test]
    async fn test_frozen_wallet_denied() {
        let store = InMemoryWalletStore::new();
        let wallet = seed(&store, 1, dec!(2.0));
        store.freeze(1);

        assert!(!WalletManager::is_withdraw_allowed(&store, &wallet, dec!(0.5))
            .await
            .unwrap());
        assert!(!WalletManager::is_deposit_allowed(&store, &wallet, dec!(0.5))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_owner_withdraw_cap_is_amount_dependent() {
        let store = InMemoryWalletStore::new();
        let wallet = seed(&store, 1, dec!(100));
        store.set_withdraw_cap(wallet.owner.uuid, dec!(10));

        let small = Amount::new(eth(), dec!(10)).unwrap();
        let large = Amount::new(eth(), dec!(10.1)).unwrap();
        assert!(WalletOwnerManager::is_withdraw_allowed(&store, &wallet.owner, &small)
            .await
            .unwrap());
        assert!(!WalletOwnerManager::is_withdraw_allowed(&store, &wallet.owner, &large)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_injected_conflicts_are_consumed() {
        let store = InMemoryWalletStore::new();
        let wallet = seed(&store, 1, dec!(2.0));
        store.inject_conflicts(1);

        let err = store.decrease_balance(&wallet, dec!(0.5)).await.unwrap_err();
        assert_eq!(err, StoreError::VersionConflict);
        // next mutation succeeds
        store.decrease_balance(&wallet, dec!(0.5)).await.unwrap();
        assert_eq!(store.balance_of(1), Some(dec!(1.5)));
    }
}
