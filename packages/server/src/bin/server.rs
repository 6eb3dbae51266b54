//! ECG relay server.
//!
//! Viewers connect over WebSocket, join the group named after their viewer id and publish
//! samples into it; every member of the group receives each sample.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin ecg-live-server
//! cargo run --bin ecg-live-server -- --host 0.0.0.0 --port 3000 --data-dir ./EcgData
//! ```

use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use ecg_live_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryGroupRepository,
        stream_store::FsStreamStore,
    },
    ui::Server,
    usecase::{
        ConnectSubscriberUseCase, DisconnectSubscriberUseCase, GetGroupsUseCase,
        GetStreamsUseCase, JoinGroupUseCase, LeaveGroupUseCase, PublishSampleUseCase,
    },
};
use ecg_live_shared::{logger::setup_logger, time::SystemClock};
use tokio::sync::RwLock;

#[derive(Parser, Debug)]
#[command(name = "ecg-live-server")]
#[command(about = "Real-time ECG sample relay with group publish/subscribe", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Directory holding the `.ecg` stream files
    #[arg(short = 'd', long, default_value = "wwwroot/EcgData")]
    data_dir: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / StreamStore
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create Repository (in-memory group table) and StreamStore
    let repository = Arc::new(InMemoryGroupRepository::new());
    let stream_store = Arc::new(FsStreamStore::new(&args.data_dir));
    tracing::info!("Serving ECG streams from '{}'", args.data_dir);

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(RwLock::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create UseCases
    let connect_subscriber_usecase =
        Arc::new(ConnectSubscriberUseCase::new(message_pusher.clone()));
    let disconnect_subscriber_usecase = Arc::new(DisconnectSubscriberUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let join_group_usecase = Arc::new(JoinGroupUseCase::new(
        repository.clone(),
        Arc::new(SystemClock),
    ));
    let leave_group_usecase = Arc::new(LeaveGroupUseCase::new(repository.clone()));
    let publish_sample_usecase = Arc::new(PublishSampleUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let get_groups_usecase = Arc::new(GetGroupsUseCase::new(repository.clone()));
    let get_streams_usecase = Arc::new(GetStreamsUseCase::new(stream_store));

    // 4. Create and run the server
    let server = Server::new(
        connect_subscriber_usecase,
        disconnect_subscriber_usecase,
        join_group_usecase,
        leave_group_usecase,
        publish_sample_usecase,
        get_groups_usecase,
        get_streams_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
