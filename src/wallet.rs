//! Wallet and WalletOwner entities.
//!
//! These are transient snapshots of persisted state: the engine holds them
//! for the duration of one transfer and never caches them across calls.
//! The owning store is the source of truth for balances.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::{Amount, AmountError, Currency};

/// The account entity a wallet belongs to.
///
/// Carries coarse-grained policy flags independent of any single wallet.
/// The owner-level policy gate may combine these flags with the candidate
/// amount (tiered limits), so the flags alone are not the final answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOwner {
    pub id: u64,
    /// External-facing identity
    pub uuid: Uuid,
    pub owner_type: String,
    pub level: String,
    pub is_trade_allowed: bool,
    pub is_withdraw_allowed: bool,
    pub is_deposit_allowed: bool,
}

/// A per-owner, per-currency, per-type balance holder.
///
/// # Invariants (enforced by the constructor and the owning store):
/// - `balance.currency == currency` - checked by [`Wallet::new`]
/// - `balance.value >= 0` always; a mutation that would violate this is
///   rejected by the store, not clamped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: u64,
    pub owner: WalletOwner,
    balance: Amount,
    pub currency: Currency,
    /// "main", "exchange", ... - a wallet is uniquely identified by
    /// owner + currency + wallet type
    pub wallet_type: String,
}

impl Wallet {
    /// Create a wallet snapshot. Fails if the balance currency does not
    /// match the wallet currency.
    pub fn new(
        id: u64,
        owner: WalletOwner,
        balance: Amount,
        currency: Currency,
        wallet_type: impl Into<String>,
    ) -> Result<Self, AmountError> {
        if balance.currency().symbol != currency.symbol {
            return Err(AmountError::CurrencyMismatch {
                expected: currency.symbol,
                actual: balance.currency().symbol.clone(),
            });
        }
        Ok(Self {
            id,
            owner,
            balance,
            currency,
            wallet_type: wallet_type.into(),
        })
    }

    #[inline]
    pub fn balance(&self) -> &Amount {
        &self.balance
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wallet[{}] owner={} type={} balance={}",
            self.id, self.owner.uuid, self.wallet_type, self.balance
        )
    }
}
