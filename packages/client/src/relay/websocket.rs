//! Relay binding over the server's WebSocket hub.
//!
//! Outbound frames go through an unbounded queue drained by a writer task, so `publish`
//! never waits on the network and frames leave in call order. A reader task routes
//! pushed samples to the attached handler and resolves join/leave acknowledgements.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use ecg_live_server::{
    domain::{GroupName, Sample},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::HUB_PATH,
};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::{Mutex, mpsc, oneshot, watch},
    task::{AbortHandle, JoinHandle},
    time::timeout,
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use super::{ConnectionState, HandlerSlot, RelayBinding, RelayConnector, SampleSender};
use crate::{
    error::ClientError,
    reconnect::ReconnectPolicy,
    relay::route_server_frame,
};

/// Default bound for one connect attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket hub URL for a server base address.
///
/// `http://host:port/` becomes `ws://host:port/ecg-hub`; `https` maps to `wss`.
pub fn hub_url_from_base(base_url: &str) -> Result<String, ClientError> {
    let mut url = if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if base_url.starts_with("ws://") || base_url.starts_with("wss://") {
        base_url.to_string()
    } else {
        return Err(ClientError::InvalidConfig(format!(
            "unsupported base address '{}'",
            base_url
        )));
    };

    let hub = HUB_PATH.trim_start_matches('/');
    if !url.trim_end_matches('/').ends_with(hub) {
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(hub);
    }
    Ok(url)
}

/// Opens WebSocket bindings with a per-attempt timeout and retries.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    hub_url: String,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
}

impl WebSocketConnector {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            hub_url: hub_url_from_base(base_url)?,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            policy: ReconnectPolicy::default(),
        })
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    async fn connect_once(&self) -> Result<WebSocketBinding, ClientError> {
        let (ws_stream, _response) =
            match timeout(self.connect_timeout, connect_async(self.hub_url.as_str())).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => return Err(ClientError::ConnectionError(e.to_string())),
                Err(_) => return Err(ClientError::Timeout(self.connect_timeout)),
            };

        let (write, mut read) = ws_stream.split();

        // The relay announces the subscriber id in the first frame
        let subscriber_id = match timeout(self.connect_timeout, read.next()).await {
            Err(_) => return Err(ClientError::Timeout(self.connect_timeout)),
            Ok(None) => {
                return Err(ClientError::ConnectionError(
                    "connection closed before handshake".to_string(),
                ));
            }
            Ok(Some(Err(e))) => return Err(ClientError::ConnectionError(e.to_string())),
            Ok(Some(Ok(Message::Text(text)))) => {
                match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(ServerMessage::Connected { subscriber_id }) => subscriber_id,
                    Ok(other) => {
                        return Err(ClientError::Protocol(format!(
                            "expected connected frame, got {:?}",
                            other
                        )));
                    }
                    Err(e) => return Err(ClientError::Protocol(e.to_string())),
                }
            }
            Ok(Some(Ok(other))) => {
                return Err(ClientError::Protocol(format!(
                    "expected connected frame, got {:?}",
                    other
                )));
            }
        };

        let state = Arc::new(watch::Sender::new(ConnectionState::Connected));
        let handler = HandlerSlot::default();
        let pending: PendingAcks = Arc::default();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let writer = writer_loop(outbound_rx, write, state.clone());
        let reader = reader_loop(read, handler.clone(), pending.clone(), state.clone());

        tracing::info!(
            "Connected to relay {} as '{}'",
            self.hub_url,
            subscriber_id
        );

        Ok(WebSocketBinding {
            subscriber_id,
            outbound: outbound_tx,
            state,
            handler,
            pending,
            ack_timeout: self.connect_timeout,
            writer_abort: writer.abort_handle(),
            reader_abort: reader.abort_handle(),
            writer: Mutex::new(Some(writer)),
        })
    }
}

#[async_trait]
impl RelayConnector for WebSocketConnector {
    async fn connect(&self) -> Result<Arc<dyn RelayBinding>, ClientError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(
                "Attempting to connect to {} (attempt {}/{})",
                self.hub_url,
                attempt,
                self.policy.max_attempts
            );

            match self.connect_once().await {
                Ok(binding) => return Ok(Arc::new(binding)),
                Err(e) if self.policy.should_retry(&e, attempt) => {
                    tracing::warn!(
                        "Connect attempt {} failed: {}. Retrying in {:?}",
                        attempt,
                        e,
                        self.policy.interval
                    );
                    tokio::time::sleep(self.policy.interval).await;
                }
                Err(e) => {
                    tracing::error!("Failed to connect after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

enum Outbound {
    Frame(String),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Ack {
    Joined(String),
    Left(String),
}

type PendingAcks = Arc<Mutex<VecDeque<(Ack, oneshot::Sender<Result<(), ClientError>>)>>>;

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;
type WsStream = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Drains the outbound queue into the socket.
fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut write: WsSink,
    state: Arc<watch::Sender<ConnectionState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send frame: {}", e);
                        break;
                    }
                }
                Outbound::Close => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!("Failed to send close frame: {}", e);
                    }
                    break;
                }
            }
        }
        state.send_replace(ConnectionState::Disconnected);
    })
}

/// Routes pushed frames until the relay goes away.
fn reader_loop(
    mut read: WsStream,
    handler: HandlerSlot,
    pending: PendingAcks,
    state: Arc<watch::Sender<ConnectionState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(server_message) = route_server_frame(text.as_str(), &handler).await
                    {
                        resolve_ack(server_message, &pending).await;
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
        state.send_replace(ConnectionState::Disconnected);
        // Waiters see a dropped sender and report NotConnected
        pending.lock().await.clear();
    })
}

/// Hand a `joined`/`left` frame to the oldest live waiter for the same group.
///
/// `error` frames name no request, so they are only logged by the router.
async fn resolve_ack(message: ServerMessage, pending: &PendingAcks) {
    let ack = match message {
        ServerMessage::Joined { group } => Ack::Joined(group),
        ServerMessage::Left { group } => Ack::Left(group),
        _ => return,
    };

    let mut queue = pending.lock().await;
    prune_abandoned(&mut queue);
    match queue.iter().position(|(expected, _)| *expected == ack) {
        Some(pos) => {
            if let Some((_, waiter)) = queue.remove(pos) {
                let _ = waiter.send(Ok(()));
            }
        }
        None => tracing::debug!("Unsolicited acknowledgement {:?}", ack),
    }
}

/// Drop waiters whose request already timed out.
fn prune_abandoned(queue: &mut VecDeque<(Ack, oneshot::Sender<Result<(), ClientError>>)>) {
    queue.retain(|(_, waiter)| !waiter.is_closed());
}

/// Group names are checked before sending so the relay never rejects a join or leave.
fn validated_group(group: &str) -> Result<String, ClientError> {
    GroupName::new(group.to_string())
        .map(GroupName::into_string)
        .map_err(|e| ClientError::InvalidConfig(format!("group name: {}", e)))
}

/// One WebSocket connection to the relay.
pub struct WebSocketBinding {
    subscriber_id: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    state: Arc<watch::Sender<ConnectionState>>,
    handler: HandlerSlot,
    pending: PendingAcks,
    ack_timeout: Duration,
    writer_abort: AbortHandle,
    reader_abort: AbortHandle,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketBinding {
    fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.state() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    fn encode(message: &ClientMessage) -> Result<String, ClientError> {
        serde_json::to_string(message).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    /// Send a frame and wait for the relay to acknowledge it.
    async fn request(&self, ack: Ack, message: ClientMessage) -> Result<(), ClientError> {
        self.ensure_connected()?;
        let frame = Self::encode(&message)?;
        let (tx, rx) = oneshot::channel();
        {
            // Enqueue under the lock so acks line up with send order
            let mut queue = self.pending.lock().await;
            queue.push_back((ack, tx));
            self.outbound
                .send(Outbound::Frame(frame))
                .map_err(|_| ClientError::NotConnected)?;
        }

        match timeout(self.ack_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::NotConnected),
            Err(_) => {
                prune_abandoned(&mut *self.pending.lock().await);
                Err(ClientError::Timeout(self.ack_timeout))
            }
        }
    }
}

#[async_trait]
impl RelayBinding for WebSocketBinding {
    fn subscriber_id(&self) -> String {
        self.subscriber_id.clone()
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    async fn join(&self, group: &str) -> Result<(), ClientError> {
        let group = validated_group(group)?;
        self.request(Ack::Joined(group.clone()), ClientMessage::Join { group })
            .await
    }

    async fn leave(&self, group: &str) -> Result<(), ClientError> {
        let group = validated_group(group)?;
        self.request(Ack::Left(group.clone()), ClientMessage::Leave { group })
            .await
    }

    async fn publish(&self, group: &str, sample: Sample) -> Result<(), ClientError> {
        self.ensure_connected()?;
        let frame = Self::encode(&ClientMessage::Publish {
            group: group.to_string(),
            value: i64::from(sample),
        })?;
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| ClientError::NotConnected)
    }

    async fn attach_handler(&self, sender: SampleSender) {
        self.handler.attach(sender).await;
    }

    async fn detach_handler(&self) {
        self.handler.detach().await;
    }

    async fn close(&self) -> Result<(), ClientError> {
        let Some(writer) = self.writer.lock().await.take() else {
            return Ok(());
        };

        self.state.send_replace(ConnectionState::Disconnected);
        let result = if self.outbound.send(Outbound::Close).is_ok() {
            match timeout(self.ack_timeout, writer).await {
                Ok(_) => Ok(()),
                Err(_) => {
                    self.writer_abort.abort();
                    Err(ClientError::Timeout(self.ack_timeout))
                }
            }
        } else {
            Ok(())
        };
        self.reader_abort.abort();
        tracing::info!("Relay binding '{}' closed", self.subscriber_id);
        result
    }
}

impl Drop for WebSocketBinding {
    fn drop(&mut self) {
        self.writer_abort.abort();
        self.reader_abort.abort();
    }
}
