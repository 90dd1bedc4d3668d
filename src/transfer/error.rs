//! Transfer error taxonomy.
//!
//! Every failure surfaces to the direct caller as a distinct, typed error;
//! none are swallowed or retried internally. `ConcurrentModification` is the
//! one variant documented as safe for the caller to retry.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by collaborator implementations (stores, listeners).
///
/// The orchestrator maps these into [`TransferError`] with leg context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("wallet not found: {0}")]
    WalletNotFound(u64),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("version conflict")]
    VersionConflict,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Transfer failure taxonomy
///
/// Error codes are stable and intended for API responses upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Malformed command: currency mismatch, non-positive amount, or the
    /// same wallet on both sides. Raised before any side effect.
    #[error("invalid transfer request: {0}")]
    InvalidTransferRequest(String),

    #[error("wallet not found: {0}")]
    WalletNotFound(u64),

    #[error("withdraw not allowed for owner {0}")]
    OwnerWithdrawNotAllowed(Uuid),

    #[error("deposit not allowed for owner {0}")]
    OwnerDepositNotAllowed(Uuid),

    #[error("withdraw not allowed for wallet {0}")]
    WalletWithdrawNotAllowed(u64),

    #[error("deposit not allowed for wallet {0}")]
    WalletDepositNotAllowed(u64),

    /// Debit would drive the balance negative, detected atomically at
    /// mutation time.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Lock or version conflict in the store. The whole operation is safe
    /// to retry by the caller.
    #[error("concurrent modification, retry the transfer")]
    ConcurrentModification,

    /// Recording failed. If balances were already mutated the enclosing
    /// atomic scope rolls them back; never left half-applied.
    #[error("transaction recording failed: {0}")]
    TransactionRecordingFailed(String),

    /// Backend fault that maps to no taxonomy entry
    #[error("store error: {0}")]
    Store(String),
}

impl TransferError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidTransferRequest(_) => "INVALID_TRANSFER_REQUEST",
            TransferError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            TransferError::OwnerWithdrawNotAllowed(_) => "OWNER_WITHDRAW_NOT_ALLOWED",
            TransferError::OwnerDepositNotAllowed(_) => "OWNER_DEPOSIT_NOT_ALLOWED",
            TransferError::WalletWithdrawNotAllowed(_) => "WALLET_WITHDRAW_NOT_ALLOWED",
            TransferError::WalletDepositNotAllowed(_) => "WALLET_DEPOSIT_NOT_ALLOWED",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::ConcurrentModification => "CONCURRENT_MODIFICATION",
            TransferError::TransactionRecordingFailed(_) => "TRANSACTION_RECORDING_FAILED",
            TransferError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether the caller may safely retry the whole transfer
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::ConcurrentModification)
    }
}

impl From<StoreError> for TransferError {
    /// Default mapping used for reads and policy checks. Mutation call
    /// sites map `InsufficientBalance` themselves to keep leg context.
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::WalletNotFound(id) => TransferError::WalletNotFound(id),
            StoreError::InsufficientBalance => TransferError::InsufficientBalance,
            StoreError::VersionConflict => TransferError::ConcurrentModification,
            StoreError::Backend(msg) => TransferError::Store(msg),
        }
    }
}
