//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Subscriber ID is empty
    #[error("Subscriber ID must not be empty")]
    SubscriberIdEmpty,

    /// Subscriber ID is too long
    #[error("Subscriber ID is too long (max {max}, got {actual})")]
    SubscriberIdTooLong { max: usize, actual: usize },

    /// Group name is empty
    #[error("Group name must not be empty")]
    GroupNameEmpty,

    /// Group name is too long
    #[error("Group name is too long (max {max}, got {actual})")]
    GroupNameTooLong { max: usize, actual: usize },

    /// Group name contains control characters
    #[error("Group name must not contain control characters")]
    GroupNameInvalidCharacter,

    /// Sample value outside of the 10-bit sensor range
    #[error("Sample value {value} is out of range [{min}, {max}]")]
    SampleOutOfRange { value: i64, min: u16, max: u16 },
}

/// Message delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// No channel is registered for the subscriber
    #[error("Subscriber '{0}' not found")]
    ClientNotFound(String),

    /// The subscriber's channel is closed
    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Stream file store errors
#[derive(Debug, Error)]
pub enum StreamStoreError {
    /// Stream file does not exist (or the name is not a plain file name)
    #[error("Stream '{0}' not found")]
    NotFound(String),

    /// Underlying I/O failure
    #[error("Stream store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
