//! Bounded polling with a fixed delay between attempts.
//!
//! Each attempt either finishes the poll, asks for another attempt, or
//! fails. Failed attempts are retried immediately and are only reported when
//! they happen on the last attempt of the budget.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Attempts before giving up, at least 1
    pub max_attempts: u32,
    /// Pause after an attempt that asked to be retried
    pub delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryConfig {
            max_attempts,
            delay,
        }
    }
}

/// What a successful attempt concluded.
#[derive(Debug, PartialEq)]
pub enum Attempt<T> {
    Done(T),
    Retry,
}

#[derive(Debug, PartialEq)]
pub enum RetryOutcome<T, E> {
    Completed { value: T, attempts: u32 },
    /// The budget ran out. `final_error` is set only when the last attempt
    /// itself failed.
    Exhausted { attempts: u32, final_error: Option<E> },
}

/// Runs `operation` with 1-based attempt numbers until it reports
/// [`Attempt::Done`] or `config.max_attempts` attempts have been made.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
    E: Display,
{
    let mut final_error = None;

    for attempt in 1..=config.max_attempts {
        match operation(attempt).await {
            Ok(Attempt::Done(value)) => {
                return RetryOutcome::Completed {
                    value,
                    attempts: attempt,
                };
            }
            Ok(Attempt::Retry) => {
                debug!(
                    operation = %operation_name,
                    attempt,
                    delay_ms = config.delay.as_millis(),
                    "Not done yet, retrying"
                );
                tokio::time::sleep(config.delay).await;
            }
            // Compared against the configured budget, so only the last
            // attempt's error survives.
            Err(e) if attempt == config.max_attempts => {
                warn!(operation = %operation_name, attempt, error = %e, "Final attempt failed");
                final_error = Some(e);
            }
            Err(e) => {
                debug!(operation = %operation_name, attempt, error = %e, "Attempt failed, retrying");
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: config.max_attempts,
        final_error,
    }
}
