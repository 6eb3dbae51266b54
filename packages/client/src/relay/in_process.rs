//! Relay binding that talks to the relay use cases in the same process.
//!
//! Used by the embedded client mode and by tests; frames take the same JSON form the
//! WebSocket hub pushes, so routing is shared with the networked binding.

use std::sync::Arc;

use async_trait::async_trait;
use ecg_live_server::{
    domain::{GroupName, Sample, SubscriberId},
    infrastructure::{
        dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
        repository::InMemoryGroupRepository,
    },
    usecase::{
        ConnectSubscriberUseCase, DisconnectSubscriberUseCase, GetGroupsUseCase,
        JoinGroupUseCase, LeaveGroupUseCase, PublishSampleUseCase,
    },
};
use ecg_live_shared::time::SystemClock;
use tokio::{
    sync::{mpsc, watch},
    task::AbortHandle,
};

use super::{
    ConnectionState, HandlerSlot, RelayBinding, RelayConnector, SampleSender,
    route_server_frame,
};
use crate::error::ClientError;

/// The relay use cases wired to in-memory infrastructure.
pub struct InProcessRelay {
    connect_subscriber_usecase: ConnectSubscriberUseCase,
    disconnect_subscriber_usecase: DisconnectSubscriberUseCase,
    join_group_usecase: JoinGroupUseCase,
    leave_group_usecase: LeaveGroupUseCase,
    publish_sample_usecase: PublishSampleUseCase,
    get_groups_usecase: GetGroupsUseCase,
}

impl Default for InProcessRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessRelay {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryGroupRepository::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::default());
        Self {
            connect_subscriber_usecase: ConnectSubscriberUseCase::new(message_pusher.clone()),
            disconnect_subscriber_usecase: DisconnectSubscriberUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            join_group_usecase: JoinGroupUseCase::new(repository.clone(), Arc::new(SystemClock)),
            leave_group_usecase: LeaveGroupUseCase::new(repository.clone()),
            publish_sample_usecase: PublishSampleUseCase::new(repository.clone(), message_pusher),
            get_groups_usecase: GetGroupsUseCase::new(repository),
        }
    }

    /// Subscriber ids currently in `group`, in join order.
    pub async fn group_members(&self, group: &str) -> Vec<String> {
        let Ok(name) = GroupName::new(group.to_string()) else {
            return Vec::new();
        };
        match self.get_groups_usecase.detail(&name).await {
            Ok(group) => group
                .member_ids()
                .into_iter()
                .map(SubscriberId::into_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Opens bindings against a shared `InProcessRelay`.
#[derive(Clone)]
pub struct InProcessConnector {
    relay: Arc<InProcessRelay>,
}

impl InProcessConnector {
    pub fn new(relay: Arc<InProcessRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl RelayConnector for InProcessConnector {
    async fn connect(&self) -> Result<Arc<dyn RelayBinding>, ClientError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let subscriber_id = self.relay.connect_subscriber_usecase.execute(tx).await;

        let state = Arc::new(watch::Sender::new(ConnectionState::Connected));
        let handler = HandlerSlot::default();

        let reader_handler = handler.clone();
        let reader_state = state.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                route_server_frame(&frame, &reader_handler).await;
            }
            reader_state.send_replace(ConnectionState::Disconnected);
        });

        tracing::info!("Connected to in-process relay as '{}'", subscriber_id);
        Ok(Arc::new(InProcessBinding {
            relay: self.relay.clone(),
            subscriber_id,
            state,
            handler,
            reader_abort: reader.abort_handle(),
        }))
    }
}

/// One connection to an `InProcessRelay`.
pub struct InProcessBinding {
    relay: Arc<InProcessRelay>,
    subscriber_id: SubscriberId,
    state: Arc<watch::Sender<ConnectionState>>,
    handler: HandlerSlot,
    reader_abort: AbortHandle,
}

impl InProcessBinding {
    fn group_name(group: &str) -> Result<GroupName, ClientError> {
        GroupName::new(group.to_string()).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.state() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }
}

#[async_trait]
impl RelayBinding for InProcessBinding {
    fn subscriber_id(&self) -> String {
        self.subscriber_id.as_str().to_string()
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    async fn join(&self, group: &str) -> Result<(), ClientError> {
        self.ensure_connected()?;
        let name = Self::group_name(group)?;
        self.relay
            .join_group_usecase
            .execute(&name, self.subscriber_id.clone())
            .await;
        Ok(())
    }

    async fn leave(&self, group: &str) -> Result<(), ClientError> {
        self.ensure_connected()?;
        let name = Self::group_name(group)?;
        self.relay
            .leave_group_usecase
            .execute(&name, &self.subscriber_id)
            .await;
        Ok(())
    }

    async fn publish(&self, group: &str, sample: Sample) -> Result<(), ClientError> {
        self.ensure_connected()?;
        let name = Self::group_name(group)?;
        let frame = ServerMessage::Sample {
            group: name.as_str().to_string(),
            value: sample.value(),
            publisher: self.subscriber_id.as_str().to_string(),
        }
        .to_json();
        self.relay
            .publish_sample_usecase
            .execute(&name, &frame)
            .await;
        Ok(())
    }

    async fn attach_handler(&self, sender: SampleSender) {
        self.handler.attach(sender).await;
    }

    async fn detach_handler(&self) {
        self.handler.detach().await;
    }

    async fn close(&self) -> Result<(), ClientError> {
        if self.state.send_replace(ConnectionState::Disconnected) == ConnectionState::Disconnected
        {
            return Ok(());
        }
        self.relay
            .disconnect_subscriber_usecase
            .execute(&self.subscriber_id)
            .await;
        self.reader_abort.abort();
        Ok(())
    }
}

impl Drop for InProcessBinding {
    fn drop(&mut self) {
        self.reader_abort.abort();
    }
}
