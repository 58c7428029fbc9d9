// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

/// Outcome of a single attempt telling [`retry_with_backoff`] whether to go again.
pub enum RetryError<E> {
    Failure(E),
    Retry(E),
}

pub fn to_retry<E>(e: impl Into<E>) -> RetryError<E> {
    RetryError::Retry(e.into())
}

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - Async function to retry. It is called afresh for every attempt.
/// * `max_attempts` - Maximum number of attempts, including the first one
/// * `initial_delay_ms` - Initial delay between retries in milliseconds
///
/// # Returns
/// The first successful value, the first [`RetryError::Failure`], or the error of the last
/// attempt once `max_attempts` is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    max_attempts: u32,
    initial_delay_ms: u64,
) -> Result<T, E>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let mut current_attempt = 1;
    let mut delay_ms = initial_delay_ms;

    loop {
        match operation(current_attempt).await {
            Ok(value) => return Ok(value),
            Err(RetryError::Retry(e)) => {
                if current_attempt >= max_attempts.max(1) {
                    warn!(
                        "Operation failed after {} attempts. Last error: {}",
                        current_attempt, e
                    );
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    current_attempt, max_attempts, delay_ms, e
                );

                sleep(Duration::from_millis(delay_ms)).await;
                current_attempt += 1;
                delay_ms = delay_ms.saturating_mul(2);
            }
            Err(RetryError::Failure(e)) => {
                error!("FAILURE!: returning to caller: {}", e);
                return Err(e);
            }
        }
    }
}
