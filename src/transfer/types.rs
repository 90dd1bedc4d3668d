//! Transfer command, result, and audit record types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::money::Amount;
use crate::wallet::Wallet;

/// Transaction identifier - ULID-based opaque audit correlator
///
/// ULIDs are monotonic, sortable, and need no coordination between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(ulid::Ulid);

impl TransactionId {
    /// Generate a fresh unique id
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// A request to move `amount` from `source_wallet` to `dest_wallet`.
///
/// Optional fields capture the caller's intent explicitly; `None` means the
/// caller provided nothing, not an empty value.
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub source_wallet: Wallet,
    pub dest_wallet: Wallet,
    pub amount: Amount,
    pub transfer_ref: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl TransferCommand {
    pub fn new(source_wallet: Wallet, dest_wallet: Wallet, amount: Amount) -> Self {
        Self {
            source_wallet,
            dest_wallet,
            amount,
            transfer_ref: None,
            description: None,
            metadata: None,
        }
    }
}

/// One side of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferLeg {
    pub owner_uuid: Uuid,
    pub wallet_type: String,
    pub balance_before: Amount,
    pub balance_after: Amount,
}

/// Detailed outcome of a successful transfer.
///
/// Produced fresh per call and never persisted as-is; the transaction
/// manager persists its own normalized [`TransactionRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub source: TransferLeg,
    pub dest: TransferLeg,
}

/// The single append-only audit entry correlating a transfer's two legs.
///
/// Created only after both legs are authorized and mutated; never updated
/// afterward.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub source_wallet_id: u64,
    pub dest_wallet_id: u64,
    pub source_owner_uuid: Uuid,
    pub dest_owner_uuid: Uuid,
    pub source_wallet_type: String,
    pub dest_wallet_type: String,
    pub amount: Amount,
    pub transfer_ref: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub transfer_date: DateTime<Utc>,
}

impl TransactionRecord {
    /// Normalize a command into its audit row. `source` and `dest` are the
    /// resolved wallets, not the possibly stale ones on the command.
    pub fn from_command(
        command: &TransferCommand,
        source: &Wallet,
        dest: &Wallet,
        transfer_date: DateTime<Utc>,
    ) -> Self {
        Self {
            source_wallet_id: source.id,
            dest_wallet_id: dest.id,
            source_owner_uuid: source.owner.uuid,
            dest_owner_uuid: dest.owner.uuid,
            source_wallet_type: source.wallet_type.clone(),
            dest_wallet_type: dest.wallet_type.clone(),
            amount: command.amount.clone(),
            transfer_ref: command.transfer_ref.clone(),
            description: command.description.clone(),
            metadata: command.metadata.clone(),
            transfer_date,
        }
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx wallet {} -> wallet {} amount={} at {}",
            self.source_wallet_id, self.dest_wallet_id, self.amount, self.transfer_date
        )
    }
}
