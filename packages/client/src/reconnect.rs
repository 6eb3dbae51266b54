//! Reconnection decisions for relay connections.
//!
//! This module contains pure functions that decide whether a failed connect attempt
//! should be retried, making them easy to test.

use std::time::Duration;

use crate::error::ClientError;

/// Default number of connect attempts
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default pause between connect attempts
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// How often and how far apart connect attempts are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            interval: RECONNECT_INTERVAL,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::ZERO,
        }
    }

    /// Whether another attempt should follow the `attempt`-th failure (1-indexed).
    pub fn should_retry(&self, error: &ClientError, attempt: u32) -> bool {
        should_attempt_reconnect(error, attempt, self.max_attempts)
    }
}

/// Check if the error comes from the transport and may go away on its own.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` for connection failures and timeouts, `false` for errors that a new attempt
/// cannot fix (e.g., a protocol violation)
pub fn is_transient(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::ConnectionError(_) | ClientError::Timeout(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The number of attempts made so far
/// * `max_attempts` - The maximum number of attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if a new attempt cannot fix the error
    if !is_transient(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}
