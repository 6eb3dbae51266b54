//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectSubscriberUseCase, DisconnectSubscriberUseCase, GetGroupsUseCase, GetStreamsUseCase,
    JoinGroupUseCase, LeaveGroupUseCase, PublishSampleUseCase,
};

use super::{
    handler::{
        get_group_detail, get_groups, get_stream_file, get_streams, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Path of the relay WebSocket endpoint
pub const HUB_PATH: &str = "/ecg-hub";

/// ECG relay server
///
/// This struct encapsulates the use cases and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_subscriber_usecase,
///     disconnect_subscriber_usecase,
///     join_group_usecase,
///     leave_group_usecase,
///     publish_sample_usecase,
///     get_groups_usecase,
///     get_streams_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connect_subscriber_usecase: Arc<ConnectSubscriberUseCase>,
        disconnect_subscriber_usecase: Arc<DisconnectSubscriberUseCase>,
        join_group_usecase: Arc<JoinGroupUseCase>,
        leave_group_usecase: Arc<LeaveGroupUseCase>,
        publish_sample_usecase: Arc<PublishSampleUseCase>,
        get_groups_usecase: Arc<GetGroupsUseCase>,
        get_streams_usecase: Arc<GetStreamsUseCase>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                connect_subscriber_usecase,
                disconnect_subscriber_usecase,
                join_group_usecase,
                leave_group_usecase,
                publish_sample_usecase,
                get_groups_usecase,
                get_streams_usecase,
            }),
        }
    }

    /// Build the router with every relay and API route.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route(HUB_PATH, get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/groups", get(get_groups))
            .route("/api/groups/{name}", get(get_group_detail))
            .route("/api/streams", get(get_streams))
            .route("/EcgData/{file_name}", get(get_stream_file))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the relay server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("ECG relay server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}{}", bind_addr, HUB_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
