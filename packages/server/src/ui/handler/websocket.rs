//! WebSocket relay handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{GroupName, PusherChannel, Sample, SubscriberId},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: replies to this subscriber and samples
/// published to its groups are sent to this subscriber's WebSocket connection in channel order.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Send a reply to this subscriber through its own outbound channel.
fn reply(tx: &PusherChannel, message: ServerMessage) {
    if tx.send(message.to_json()).is_err() {
        tracing::debug!("Outbound channel closed, reply dropped");
    }
}

fn reply_error(tx: &PusherChannel, message: impl Into<String>) {
    reply(
        tx,
        ServerMessage::Error {
            message: message.into(),
        },
    );
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this subscriber to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriber_id = state
        .connect_subscriber_usecase
        .execute(tx.clone())
        .await;
    tracing::info!("Subscriber '{}' connected", subscriber_id);

    // 接続通知は必ず最初のフレーム
    reply(
        &tx,
        ServerMessage::Connected {
            subscriber_id: subscriber_id.as_str().to_string(),
        },
    );

    let state_clone = state.clone();
    let subscriber_id_clone = subscriber_id.clone();

    // Spawn a task to receive messages from this subscriber
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", subscriber_id_clone, text);
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            handle_client_message(
                                &state_clone,
                                &subscriber_id_clone,
                                &tx,
                                client_msg,
                            )
                            .await;
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse message as JSON: {}", e);
                            reply_error(&tx, format!("malformed message: {}", e));
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Subscriber '{}' requested close", subscriber_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push replies and samples to this subscriber
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let left = state
        .disconnect_subscriber_usecase
        .execute(&subscriber_id)
        .await;
    tracing::info!(
        "Subscriber '{}' disconnected, removed from {} group(s)",
        subscriber_id,
        left.len()
    );
}

async fn handle_client_message(
    state: &AppState,
    subscriber_id: &SubscriberId,
    tx: &PusherChannel,
    message: ClientMessage,
) {
    match message {
        ClientMessage::Join { group } => {
            let Ok(group_name) = GroupName::try_from(group) else {
                reply_error(tx, "invalid group name");
                return;
            };
            state
                .join_group_usecase
                .execute(&group_name, subscriber_id.clone())
                .await;
            reply(
                tx,
                ServerMessage::Joined {
                    group: group_name.into_string(),
                },
            );
        }
        ClientMessage::Leave { group } => {
            let Ok(group_name) = GroupName::try_from(group) else {
                reply_error(tx, "invalid group name");
                return;
            };
            state
                .leave_group_usecase
                .execute(&group_name, subscriber_id)
                .await;
            reply(
                tx,
                ServerMessage::Left {
                    group: group_name.into_string(),
                },
            );
        }
        ClientMessage::Publish { group, value } => {
            let group_name = match GroupName::try_from(group) {
                Ok(name) => name,
                Err(e) => {
                    reply_error(tx, e.to_string());
                    return;
                }
            };
            let sample = match Sample::try_from(value) {
                Ok(sample) => sample,
                Err(e) => {
                    tracing::warn!("Rejected sample from '{}': {}", subscriber_id, e);
                    reply_error(tx, e.to_string());
                    return;
                }
            };

            let json = ServerMessage::Sample {
                group: group_name.as_str().to_string(),
                value: sample.value(),
                publisher: subscriber_id.as_str().to_string(),
            }
            .to_json();
            state
                .publish_sample_usecase
                .execute(&group_name, &json)
                .await;
        }
    }
}
