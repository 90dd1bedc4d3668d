//! wallet_core - Custodial wallet balance-transfer engine
//!
//! Moves funds between two internally held wallets while enforcing
//! multi-layer authorization, atomicity, and an auditable transaction
//! record.
//!
//! # Modules
//!
//! - [`money`] - `Currency` and the non-negative `Amount` value type
//! - [`wallet`] - `Wallet` / `WalletOwner` entities
//! - [`transfer`] - the engine: collaborator traits, orchestrator, error
//!   taxonomy, retry helper, in-memory reference store
//! - [`config`] - host configuration (logging, retry defaults)
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod money;
pub mod transfer;
pub mod wallet;

// Convenient re-exports at crate root
pub use config::EngineConfig;
pub use money::{Amount, AmountError, Currency};
pub use transfer::{
    RetryPolicy, StoreError, TransactionId, TransactionManager, TransactionRecord,
    TransferCommand, TransferError, TransferLeg, TransferResult, TransferService,
    WalletListener, WalletManager, WalletOwnerManager, transfer_with_retry,
};
pub use wallet::{Wallet, WalletOwner};
