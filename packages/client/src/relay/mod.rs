//! Client side of the group relay.
//!
//! A `RelayConnector` opens a `RelayBinding`: one connection to the relay, through which
//! the viewer joins groups, publishes samples and receives samples published by others.

pub mod in_process;
pub mod websocket;

use std::sync::Arc;

use async_trait::async_trait;
use ecg_live_server::{domain::Sample, infrastructure::dto::websocket::ServerMessage};
use tokio::sync::{Mutex, mpsc};

use crate::error::ClientError;

pub use in_process::{InProcessConnector, InProcessRelay};
pub use websocket::{WebSocketConnector, hub_url_from_base};

/// Lifecycle of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// A sample pushed by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedSample {
    pub group: String,
    pub value: Sample,
    pub publisher: String,
}

pub type SampleSender = mpsc::UnboundedSender<ReceivedSample>;

/// One open connection to the relay.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayBinding: Send + Sync {
    /// Identity assigned by the relay; published samples carry it as `publisher`.
    fn subscriber_id(&self) -> String;

    fn state(&self) -> ConnectionState;

    /// Join a group; idempotent on the relay side.
    async fn join(&self, group: &str) -> Result<(), ClientError>;

    /// Leave a group; idempotent on the relay side.
    async fn leave(&self, group: &str) -> Result<(), ClientError>;

    /// Fire-and-forget publish to every member of `group`.
    async fn publish(&self, group: &str, sample: Sample) -> Result<(), ClientError>;

    /// Route received samples to `sender`, replacing any previous handler.
    async fn attach_handler(&self, sender: SampleSender);

    async fn detach_handler(&self);

    /// Close the connection. Closing twice is a no-op.
    async fn close(&self) -> Result<(), ClientError>;
}

/// Opens bindings.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn RelayBinding>, ClientError>;
}

/// Where received samples go.
#[derive(Debug, Clone, Default)]
pub struct HandlerSlot {
    inner: Arc<Mutex<Option<SampleSender>>>,
}

impl HandlerSlot {
    pub async fn attach(&self, sender: SampleSender) {
        *self.inner.lock().await = Some(sender);
    }

    pub async fn detach(&self) {
        self.inner.lock().await.take();
    }

    /// Returns `false` when no live handler is attached.
    pub async fn dispatch(&self, sample: ReceivedSample) -> bool {
        let mut slot = self.inner.lock().await;
        let Some(sender) = slot.as_ref() else {
            tracing::debug!("No handler attached, sample from '{}' dropped", sample.publisher);
            return false;
        };
        if sender.send(sample).is_err() {
            tracing::debug!("Handler receiver dropped, detaching");
            slot.take();
            return false;
        }
        true
    }
}

/// Route one relay frame to the handler slot.
///
/// Returns the decoded message so the caller can act on acknowledgements.
pub(crate) async fn route_server_frame(text: &str, slot: &HandlerSlot) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse relay frame: {}", e);
            return None;
        }
    };

    match &message {
        ServerMessage::Sample {
            group,
            value,
            publisher,
        } => match Sample::new(i64::from(*value)) {
            Ok(sample) => {
                slot.dispatch(ReceivedSample {
                    group: group.clone(),
                    value: sample,
                    publisher: publisher.clone(),
                })
                .await;
            }
            Err(e) => tracing::warn!("Dropping invalid sample from relay: {}", e),
        },
        ServerMessage::Joined { group } => tracing::debug!("Joined group '{}'", group),
        ServerMessage::Left { group } => tracing::debug!("Left group '{}'", group),
        ServerMessage::Error { message } => tracing::warn!("Relay error: {}", message),
        ServerMessage::Connected { subscriber_id } => {
            tracing::debug!("Relay assigned subscriber id '{}'", subscriber_id)
        }
    }
    Some(message)
}
