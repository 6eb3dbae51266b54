//! Error types for the ECG viewer.

use std::time::Duration;

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A connect attempt or a relay acknowledgement did not arrive in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The relay binding is closed or was never connected
    #[error("Relay binding is not connected")]
    NotConnected,

    /// The requested stream does not exist in the sample source
    #[error("Stream '{0}' not found")]
    StreamNotFound(String),

    /// Stream index outside of the available streams
    #[error("Stream index {index} is out of range ({count} streams available)")]
    InvalidStreamIndex { index: usize, count: usize },

    /// The sample source failed for a reason other than a missing stream
    #[error("Sample source error: {0}")]
    Source(String),

    /// Invalid playback configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A live session already exists for the viewer id
    #[error("Viewer '{0}' is already initialized")]
    DuplicateViewer(String),

    /// The session was torn down and accepts no further stream changes
    #[error("Viewer '{0}' has been torn down")]
    SessionClosed(String),

    /// No session exists for the viewer id
    #[error("Viewer '{0}' not found")]
    ViewerNotFound(String),

    /// Unexpected frame from the relay
    #[error("Protocol error: {0}")]
    Protocol(String),
}
