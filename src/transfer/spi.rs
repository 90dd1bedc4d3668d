//! Collaborator interfaces consumed by the transfer engine.
//!
//! Implementations (SQL, in-memory, remote) live outside the engine and are
//! injected through the [`TransferService`](super::service::TransferService)
//! constructor. Policy checks are read-only and idempotent; mutations carry
//! the atomicity contract spelled out per method.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::error::StoreError;
use super::types::{TransactionId, TransactionRecord};
use crate::money::Amount;
use crate::wallet::{Wallet, WalletOwner};

/// Wallet-level reads, policy checks, and balance mutation.
///
/// `decrease_balance` and `increase_balance` must be atomic with respect to
/// concurrent mutators of the same wallet. The host store must cover the
/// debit, credit, and record insert of one transfer with a transactional
/// scope (read-committed or better, row locks or version checks acquired in
/// ascending wallet-id order).
#[async_trait]
pub trait WalletManager: Send + Sync {
    /// Fetch the latest persisted state of a wallet
    async fn find_wallet_by_id(&self, id: u64) -> Result<Option<Wallet>, StoreError>;

    /// Wallet-level withdraw gate (frozen wallet, balance class, ...)
    async fn is_withdraw_allowed(&self, wallet: &Wallet, quantity: Decimal)
        -> Result<bool, StoreError>;

    /// Wallet-level deposit gate
    async fn is_deposit_allowed(&self, wallet: &Wallet, quantity: Decimal)
        -> Result<bool, StoreError>;

    /// Debit the wallet. Overdraft must be detected under the same atomic
    /// section that reads the balance, never via a prior snapshot.
    async fn decrease_balance(&self, wallet: &Wallet, quantity: Decimal)
        -> Result<(), StoreError>;

    /// Credit the wallet
    async fn increase_balance(&self, wallet: &Wallet, quantity: Decimal)
        -> Result<(), StoreError>;
}

/// Owner-level policy gate. May be amount-dependent (tiered limits).
#[async_trait]
pub trait WalletOwnerManager: Send + Sync {
    async fn is_withdraw_allowed(
        &self,
        owner: &WalletOwner,
        amount: &Amount,
    ) -> Result<bool, StoreError>;

    async fn is_deposit_allowed(
        &self,
        owner: &WalletOwner,
        amount: &Amount,
    ) -> Result<bool, StoreError>;
}

/// Persists the single correlated audit record of a transfer.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Append-only insert. Invoked exactly once per successful transfer,
    /// inside the same atomic scope as the balance mutations.
    async fn save(&self, record: &TransactionRecord) -> Result<TransactionId, StoreError>;
}

/// Observer dispatch failure. Listeners are best-effort; these errors are
/// logged, never propagated.
#[derive(Error, Debug, Clone)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

/// Notified after a transfer fully commits: withdraw leg first, deposit leg
/// second, exactly once each. Consumers must be idempotent.
#[async_trait]
pub trait WalletListener: Send + Sync {
    async fn on_withdraw(
        &self,
        owner: &WalletOwner,
        wallet: &Wallet,
        amount: &Amount,
        transaction_id: &TransactionId,
        at: DateTime<Utc>,
    ) -> Result<(), ListenerError>;

    async fn on_deposit(
        &self,
        owner: &WalletOwner,
        wallet: &Wallet,
        amount: &Amount,
        counterparty: &WalletOwner,
        transaction_id: &TransactionId,
        at: DateTime<Utc>,
    ) -> Result<(), ListenerError>;
}

/// Counting mocks for orchestrator tests.
///
/// Every call is tallied so tests can assert gate ordering and short-circuit
/// behavior via collaborator call counts.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct Counts {
        pub find: AtomicUsize,
        pub withdraw_check: AtomicUsize,
        pub deposit_check: AtomicUsize,
        pub decrease: AtomicUsize,
        pub increase: AtomicUsize,
    }

    pub struct MockWalletManager {
        pub counts: Counts,
        wallets: Mutex<Vec<Wallet>>,
        pub allow_withdraw: Mutex<bool>,
        pub allow_deposit: Mutex<bool>,
        pub decrease_result: Mutex<Result<(), StoreError>>,
        pub increase_result: Mutex<Result<(), StoreError>>,
    }

    impl MockWalletManager {
        pub fn new(wallets: Vec<Wallet>) -> Self {
            Self {
                counts: Counts::default(),
                wallets: Mutex::new(wallets),
                allow_withdraw: Mutex::new(true),
                allow_deposit: Mutex::new(true),
                decrease_result: Mutex::new(Ok(())),
                increase_result: Mutex::new(Ok(())),
            }
        }

        pub fn set_decrease_result(&self, r: Result<(), StoreError>) {
            *self.decrease_result.lock().unwrap() = r;
        }

        pub fn set_increase_result(&self, r: Result<(), StoreError>) {
            *self.increase_result.lock().unwrap() = r;
        }
    }

    #[async_trait]
    impl WalletManager for MockWalletManager {
        async fn find_wallet_by_id(&self, id: u64) -> Result<Option<Wallet>, StoreError> {
            self.counts.find.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .wallets
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.id == id)
                .cloned())
        }

        async fn is_withdraw_allowed(
            &self,
            _wallet: &Wallet,
            _quantity: Decimal,
        ) -> Result<bool, StoreError> {
            self.counts.withdraw_check.fetch_add(1, Ordering::SeqCst);
            Ok(*self.allow_withdraw.lock().unwrap())
        }

        async fn is_deposit_allowed(
            &self,
            _wallet: &Wallet,
            _quantity: Decimal,
        ) -> Result<bool, StoreError> {
            self.counts.deposit_check.fetch_add(1, Ordering::SeqCst);
            Ok(*self.allow_deposit.lock().unwrap())
        }

        async fn decrease_balance(
            &self,
            _wallet: &Wallet,
            _quantity: Decimal,
        ) -> Result<(), StoreError> {
            self.counts.decrease.fetch_add(1, Ordering::SeqCst);
            self.decrease_result.lock().unwrap().clone()
        }

        async fn increase_balance(
            &self,
            _wallet: &Wallet,
            _quantity: Decimal,
        ) -> Result<(), StoreError> {
            self.counts.increase.fetch_add(1, Ordering::SeqCst);
            self.increase_result.lock().unwrap().clone()
        }
    }

    pub struct MockOwnerManager {
        pub withdraw_checks: AtomicUsize,
        pub deposit_checks: AtomicUsize,
        pub allow_withdraw: Mutex<bool>,
        pub allow_deposit: Mutex<bool>,
    }

    impl MockOwnerManager {
        pub fn new() -> Self {
            Self {
                withdraw_checks: AtomicUsize::new(0),
                deposit_checks: AtomicUsize::new(0),
                allow_withdraw: Mutex::new(true),
                allow_deposit: Mutex::new(true),
            }
        }
    }

    #[async_trait]
    impl WalletOwnerManager for MockOwnerManager {
        async fn is_withdraw_allowed(
            &self,
            _owner: &WalletOwner,
            _amount: &Amount,
        ) -> Result<bool, StoreError> {
            self.withdraw_checks.fetch_add(1, Ordering::SeqCst);
            Ok(*self.allow_withdraw.lock().unwrap())
        }

        async fn is_deposit_allowed(
            &self,
            _owner: &WalletOwner,
            _amount: &Amount,
        ) -> Result<bool, StoreError> {
            self.deposit_checks.fetch_add(1, Ordering::SeqCst);
            Ok(*self.allow_deposit.lock().unwrap())
        }
    }

    pub struct MockTransactionManager {
        pub saves: AtomicUsize,
        pub fail_save: Mutex<bool>,
    }

    impl MockTransactionManager {
        pub fn new() -> Self {
            Self {
                saves: AtomicUsize::new(0),
                fail_save: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl TransactionManager for MockTransactionManager {
        async fn save(&self, _record: &TransactionRecord) -> Result<TransactionId, StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if *self.fail_save.lock().unwrap() {
                return Err(StoreError::Backend("transaction log unavailable".into()));
            }
            Ok(TransactionId::new())
        }
    }

    pub struct MockListener {
        pub withdraws: AtomicUsize,
        pub deposits: AtomicUsize,
        pub fail: Mutex<bool>,
    }

    impl MockListener {
        pub fn new() -> Self {
            Self {
                withdraws: AtomicUsize::new(0),
                deposits: AtomicUsize::new(0),
                fail: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl WalletListener for MockListener {
        async fn on_withdraw(
            &self,
            _owner: &WalletOwner,
            _wallet: &Wallet,
            _amount: &Amount,
            _transaction_id: &TransactionId,
            _at: DateTime<Utc>,
        ) -> Result<(), ListenerError> {
            self.withdraws.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(ListenerError("mock withdraw listener failure".into()));
            }
            Ok(())
        }

        async fn on_deposit(
            &self,
            _owner: &WalletOwner,
            _wallet: &Wallet,
            _amount: &Amount,
            _counterparty: &WalletOwner,
            _transaction_id: &TransactionId,
            _at: DateTime<Utc>,
        ) -> Result<(), ListenerError> {
            self.deposits.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(ListenerError("mock deposit listener failure".into()));
            }
            Ok(())
        }
    }
}
