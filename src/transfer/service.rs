//! Transfer orchestrator.
//!
//! Composes the policy gates, balance mutations, transaction recording, and
//! observer dispatch into one all-or-nothing operation. Any gate failure
//! short-circuits before mutation; any failure before the atomic section
//! guarantees zero mutation and zero recorded transaction.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::spi::{TransactionManager, WalletListener, WalletManager, WalletOwnerManager};
use super::types::{TransactionRecord, TransferCommand, TransferLeg, TransferResult};
use crate::wallet::Wallet;

/// The wallet transfer engine.
///
/// Exposes exactly one operation, [`transfer`](Self::transfer). Collaborators
/// are injected at construction; the engine holds no state of its own and
/// never caches wallets across calls.
pub struct TransferService {
    wallet_manager: Arc<dyn WalletManager>,
    wallet_listener: Arc<dyn WalletListener>,
    wallet_owner_manager: Arc<dyn WalletOwnerManager>,
    transaction_manager: Arc<dyn TransactionManager>,
}

impl TransferService {
    pub fn new(
        wallet_manager: Arc<dyn WalletManager>,
        wallet_listener: Arc<dyn WalletListener>,
        wallet_owner_manager: Arc<dyn WalletOwnerManager>,
        transaction_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            wallet_manager,
            wallet_listener,
            wallet_owner_manager,
            transaction_manager,
        }
    }

    /// Move `command.amount` from the source wallet to the destination
    /// wallet.
    ///
    /// Sequence: validate, re-resolve both wallets, policy gates
    /// (owner-withdraw, wallet-withdraw, owner-deposit, wallet-deposit),
    /// snapshot, debit + credit + record inside the store's atomic scope,
    /// then best-effort observer dispatch.
    ///
    /// Errors are never retried internally; `ConcurrentModification` is safe
    /// for the caller to retry as a whole.
    pub async fn transfer(&self, command: TransferCommand) -> Result<TransferResult, TransferError> {
        self.validate(&command)?;

        // Re-fetch the latest persisted state so gates and snapshots never
        // act on stale command-attached wallets.
        let source = self.resolve(command.source_wallet.id).await?;
        let dest = self.resolve(command.dest_wallet.id).await?;

        let amount = command.amount.clone();
        let quantity = amount.value();

        if !source.balance().same_currency(&amount) || !dest.balance().same_currency(&amount) {
            return Err(TransferError::InvalidTransferRequest(format!(
                "resolved wallet currency does not match transfer currency {}",
                amount.currency()
            )));
        }

        debug!(
            source_wallet = source.id,
            dest_wallet = dest.id,
            amount = %amount,
            "transfer requested"
        );

        // Policy gates: owner level before wallet level, withdraw leg before
        // deposit leg. First denial aborts with the leg-specific error.
        if !self
            .wallet_owner_manager
            .is_withdraw_allowed(&source.owner, &amount)
            .await?
        {
            return Err(TransferError::OwnerWithdrawNotAllowed(source.owner.uuid));
        }
        if !self
            .wallet_manager
            .is_withdraw_allowed(&source, quantity)
            .await?
        {
            return Err(TransferError::WalletWithdrawNotAllowed(source.id));
        }
        if !self
            .wallet_owner_manager
            .is_deposit_allowed(&dest.owner, &amount)
            .await?
        {
            return Err(TransferError::OwnerDepositNotAllowed(dest.owner.uuid));
        }
        if !self
            .wallet_manager
            .is_deposit_allowed(&dest, quantity)
            .await?
        {
            return Err(TransferError::WalletDepositNotAllowed(dest.id));
        }

        let source_before = source.balance().clone();
        let dest_before = dest.balance().clone();

        // Debit source. Overdraft and version conflicts are detected by the
        // store under its own atomic section.
        self.wallet_manager
            .decrease_balance(&source, quantity)
            .await?;

        // Credit destination. If this fails after the debit committed,
        // compensate the debit so a non-transactional store is never left
        // half-applied.
        if let Err(e) = self.wallet_manager.increase_balance(&dest, quantity).await {
            self.undo_debit(&source, &dest, quantity, false).await;
            return Err(e.into());
        }

        // Record the correlated audit entry. A transfer must never report
        // success without a record id.
        let record = TransactionRecord::from_command(&command, &source, &dest, Utc::now());
        let transaction_id = match self.transaction_manager.save(&record).await {
            Ok(id) => id,
            Err(e) => {
                self.undo_debit(&source, &dest, quantity, true).await;
                return Err(TransferError::TransactionRecordingFailed(e.to_string()));
            }
        };

        info!(
            transaction_id = %transaction_id,
            source_wallet = source.id,
            dest_wallet = dest.id,
            amount = %amount,
            "transfer committed"
        );

        // Observer dispatch: withdraw leg then deposit leg, exactly once
        // each, outside the atomic boundary. Failures are logged only.
        if let Err(e) = self
            .wallet_listener
            .on_withdraw(
                &source.owner,
                &source,
                &amount,
                &transaction_id,
                record.transfer_date,
            )
            .await
        {
            warn!(transaction_id = %transaction_id, error = %e, "withdraw listener failed");
        }
        if let Err(e) = self
            .wallet_listener
            .on_deposit(
                &dest.owner,
                &dest,
                &amount,
                &source.owner,
                &transaction_id,
                record.transfer_date,
            )
            .await
        {
            warn!(transaction_id = %transaction_id, error = %e, "deposit listener failed");
        }

        let source_after = source_before
            .checked_sub(&amount)
            .map_err(|e| TransferError::Store(e.to_string()))?;
        let dest_after = dest_before
            .checked_add(&amount)
            .map_err(|e| TransferError::Store(e.to_string()))?;

        Ok(TransferResult {
            transaction_id,
            amount,
            source: TransferLeg {
                owner_uuid: source.owner.uuid,
                wallet_type: source.wallet_type.clone(),
                balance_before: source_before,
                balance_after: source_after,
            },
            dest: TransferLeg {
                owner_uuid: dest.owner.uuid,
                wallet_type: dest.wallet_type.clone(),
                balance_before: dest_before,
                balance_after: dest_after,
            },
        })
    }

    /// Command shape validation. Runs before any collaborator call, so a
    /// violation has zero side effects.
    fn validate(&self, command: &TransferCommand) -> Result<(), TransferError> {
        if command.source_wallet.id == command.dest_wallet.id {
            return Err(TransferError::InvalidTransferRequest(
                "source and destination wallet are the same".to_string(),
            ));
        }
        // Zero is rejected, not treated as a no-op success.
        if command.amount.is_zero() {
            return Err(TransferError::InvalidTransferRequest(
                "transfer amount must be positive".to_string(),
            ));
        }
        let currencies_match = command.amount.same_currency(command.source_wallet.balance())
            && command.amount.same_currency(command.dest_wallet.balance());
        if !currencies_match {
            return Err(TransferError::InvalidTransferRequest(format!(
                "source, destination and amount currencies must all be {}",
                command.amount.currency()
            )));
        }
        Ok(())
    }

    async fn resolve(&self, id: u64) -> Result<Wallet, TransferError> {
        self.wallet_manager
            .find_wallet_by_id(id)
            .await?
            .ok_or(TransferError::WalletNotFound(id))
    }

    /// Compensate already-committed mutations after a later step failed.
    /// With a transactional host store this never observes an intermediate
    /// state; for simple stores it restores both balances.
    async fn undo_debit(
        &self,
        source: &Wallet,
        dest: &Wallet,
        quantity: rust_decimal::Decimal,
        credit_committed: bool,
    ) {
        if credit_committed
            && let Err(e) = self.wallet_manager.decrease_balance(dest, quantity).await
        {
            error!(
                dest_wallet = dest.id,
                error = %e,
                "failed to compensate destination credit"
            );
        }
        if let Err(e) = self.wallet_manager.increase_balance(source, quantity).await {
            error!(
                source_wallet = source.id,
                error = %e,
                "failed to compensate source debit"
            );
        }
    }
}
