//! Bounded retry for version-conflict failures.
//!
//! The engine never retries internally; this helper implements the
//! caller-side policy: retry only `ConcurrentModification`, a bounded number
//! of attempts, exponential backoff between attempts.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::error::TransferError;
use super::service::TransferService;
use super::types::{TransferCommand, TransferResult};

/// Retry policy for transfers that hit a lock or version conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Initial backoff in milliseconds, doubled after every failed attempt
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 50,
        }
    }
}

/// Run `transfer`, retrying on `ConcurrentModification` per `policy`.
///
/// All other errors, and a conflict on the final attempt, surface unchanged.
pub async fn transfer_with_retry(
    service: &TransferService,
    command: TransferCommand,
    policy: &RetryPolicy,
) -> Result<TransferResult, TransferError> {
    let mut backoff = Duration::from_millis(policy.backoff_ms);
    let mut attempt = 1u32;

    loop {
        match service.transfer(command.clone()).await {
            Err(e) if e.is_retryable() && attempt < policy.max_attempts.max(1) => {
                warn!(attempt, error = %e, "transfer conflicted, retrying");
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            other => return other,
        }
    }
}
