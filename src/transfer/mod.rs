//! Wallet transfer engine.
//!
//! One public operation — [`TransferService::transfer`] — composes the
//! policy gates, the balance mutations, the transaction record, and the
//! observer dispatch into an all-or-nothing move between two wallets.

pub mod error;
pub mod memory;
pub mod retry;
pub mod service;
pub mod spi;
pub mod types;


pub use error::{StoreError, TransferError};
pub use retry::{RetryPolicy, transfer_with_retry};
pub use service::TransferService;
pub use spi::{
    ListenerError, TransactionManager, WalletListener, WalletManager, WalletOwnerManager,
};
pub use types::{
    TransactionId, TransactionRecord, TransferCommand, TransferLeg, TransferResult,
};
