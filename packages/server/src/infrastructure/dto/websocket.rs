//! WebSocket message DTOs.
//!
//! Every frame is a JSON text frame tagged by `type`.

use serde::{Deserialize, Serialize};

/// Messages sent from a client to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a group
    Join { group: String },
    /// Leave a group
    Leave { group: String },
    /// Publish one sample to every member of a group
    Publish { group: String, value: i64 },
}

/// Messages pushed from the relay to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First frame of every connection, carrying the connection's identity
    Connected { subscriber_id: String },
    /// Acknowledges a join
    Joined { group: String },
    /// Acknowledges a leave
    Left { group: String },
    /// A sample published to a group this connection is a member of
    Sample {
        group: String,
        value: u16,
        publisher: String,
    },
    /// The previous frame could not be processed
    Error { message: String },
}

impl ServerMessage {
    /// Serialize to the JSON text sent over the socket
    pub fn to_json(&self) -> String {
        // Serializing these plain enums cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
