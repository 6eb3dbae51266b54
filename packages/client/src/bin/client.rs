//! Interactive ECG viewer.
//!
//! Loads a recorded stream from the server, plays it back one sample per tick into a
//! rolling chart and relays each sample to the group named after the viewer id.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin ecg-live-client
//! cargo run --bin ecg-live-client -- --viewer-id ward-3 --stream-index 2
//! cargo run --bin ecg-live-client -- --embedded ./wwwroot/EcgData
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use ecg_live_client::{
    PlaybackConfig,
    runner::{ClientOptions, run_client},
};
use ecg_live_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "ecg-live-client")]
#[command(about = "Paced ECG playback viewer with group relay", long_about = None)]
struct Args {
    /// Server base address
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080/")]
    url: String,

    /// Viewer id, also the relay group name
    #[arg(short = 'v', long, default_value = "ecg-chart")]
    viewer_id: String,

    /// Index of the stream to load first
    #[arg(short = 's', long, default_value = "0")]
    stream_index: usize,

    /// Playback tick interval in milliseconds
    #[arg(long, default_value = "8")]
    tick_ms: u64,

    /// Number of samples kept in the chart window
    #[arg(long, default_value = "2550")]
    capacity: usize,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout_secs: u64,

    /// Play streams from this directory through an in-process relay, without a server
    #[arg(short = 'e', long)]
    embedded: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let playback = PlaybackConfig {
        tick_interval: Duration::from_millis(args.tick_ms),
        capacity: args.capacity,
        ..PlaybackConfig::default()
    };
    if let Err(e) = playback.validate() {
        tracing::error!("Invalid playback settings: {}", e);
        std::process::exit(1);
    }

    let options = ClientOptions {
        base_url: args.url,
        viewer_id: args.viewer_id,
        stream_index: args.stream_index,
        playback,
        connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        embedded: args.embedded,
    };

    // Run the client
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
