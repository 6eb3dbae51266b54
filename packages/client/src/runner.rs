//! Interactive viewer: a readline prompt driving one viewer session.

use std::{path::PathBuf, sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::PlaybackConfig,
    error::ClientError,
    formatter::StatusFormatter,
    registry::ViewerRegistry,
    relay::{InProcessConnector, InProcessRelay},
    source::FsSampleSource,
    ui::redisplay_prompt,
};

/// Everything needed to start the interactive viewer.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Server base address, e.g. `http://127.0.0.1:8080/`
    pub base_url: String,
    pub viewer_id: String,
    pub stream_index: usize,
    pub playback: PlaybackConfig,
    pub connect_timeout: Duration,
    /// Play from this directory through an in-process relay instead of a server
    pub embedded: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Switch(usize),
    Next,
    Previous,
    List,
    Status,
    Snapshot(PathBuf),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err("empty command".to_string());
        };
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", name));
        }

        match (name, argument) {
            ("start", None) => Ok(Command::Start),
            ("stop", None) => Ok(Command::Stop),
            ("switch", Some(n)) => n
                .parse()
                .map(Command::Switch)
                .map_err(|_| format!("invalid stream index '{}'", n)),
            ("switch", None) => Err("usage: switch <n>".to_string()),
            ("next", None) => Ok(Command::Next),
            ("prev" | "previous", None) => Ok(Command::Previous),
            ("list", None) => Ok(Command::List),
            ("status", None) => Ok(Command::Status),
            ("snapshot", Some(path)) => Ok(Command::Snapshot(PathBuf::from(path))),
            ("snapshot", None) => Err("usage: snapshot <file>".to_string()),
            ("help", None) => Ok(Command::Help),
            ("quit" | "exit", None) => Ok(Command::Quit),
            (name, Some(_)) if is_known(name) => Err(format!("'{}' takes no argument", name)),
            (name, _) => Err(format!("unknown command '{}', type 'help'", name)),
        }
    }
}

fn is_known(name: &str) -> bool {
    matches!(
        name,
        "start" | "stop" | "next" | "prev" | "previous" | "list" | "status" | "help" | "quit"
            | "exit"
    )
}

/// Run the interactive viewer until `quit`, Ctrl+C or Ctrl+D.
pub async fn run_client(options: ClientOptions) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ViewerRegistry::new(options.playback.clone())
        .with_connect_timeout(options.connect_timeout);
    let viewer_id = options.viewer_id.clone();

    match &options.embedded {
        Some(data_dir) => {
            tracing::info!("Playing from '{}' through an in-process relay", data_dir.display());
            let relay = Arc::new(InProcessRelay::new());
            registry
                .init_with(
                    &viewer_id,
                    Arc::new(FsSampleSource::new(data_dir)),
                    Arc::new(InProcessConnector::new(relay)),
                    options.stream_index,
                )
                .await?;
        }
        None => {
            registry
                .init(&viewer_id, &options.base_url, options.stream_index)
                .await?;
        }
    }

    println!(
        "\nViewer '{}' ready. Type 'start' to play, 'help' for commands, Ctrl+C to exit.\n",
        viewer_id
    );

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let viewer_id_for_prompt = viewer_id.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", viewer_id_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        let command = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match execute(&registry, &viewer_id, command).await {
            Ok(output) if !output.is_empty() => println!("{}", output),
            Ok(_) => {}
            Err(e) => println!("error: {}", e),
        }
        redisplay_prompt(&viewer_id);
    }

    registry.teardown_all().await;
    tracing::info!("Viewer '{}' closed", viewer_id);
    Ok(())
}

/// Execute one command and return the text to show.
pub async fn execute(
    registry: &ViewerRegistry,
    viewer_id: &str,
    command: Command,
) -> Result<String, ClientError> {
    match command {
        Command::Start => {
            if registry.start(viewer_id).await? {
                Ok("playing".to_string())
            } else {
                Ok("cannot start: see log".to_string())
            }
        }
        Command::Stop => {
            registry.stop(viewer_id).await?;
            Ok("stopped".to_string())
        }
        Command::Switch(index) => {
            registry.switch_stream(viewer_id, index).await?;
            switched(registry, viewer_id).await
        }
        Command::Next => {
            if registry.next_stream(viewer_id).await? {
                switched(registry, viewer_id).await
            } else {
                Ok("already at the last stream".to_string())
            }
        }
        Command::Previous => {
            if registry.previous_stream(viewer_id).await? {
                switched(registry, viewer_id).await
            } else {
                Ok("already at the first stream".to_string())
            }
        }
        Command::List => {
            let (streams, current) = registry.streams(viewer_id).await?;
            Ok(StatusFormatter::format_stream_list(&streams, current))
        }
        Command::Status => {
            let status = registry.status(viewer_id).await?;
            Ok(StatusFormatter::format_status(&status))
        }
        Command::Snapshot(path) => {
            let svg = registry.snapshot(viewer_id).await?;
            match tokio::fs::write(&path, svg).await {
                Ok(()) => Ok(format!("chart written to {}", path.display())),
                Err(e) => Ok(format!("failed to write {}: {}", path.display(), e)),
            }
        }
        Command::Help => Ok(StatusFormatter::format_help()),
        Command::Quit => Ok(String::new()),
    }
}

async fn switched(registry: &ViewerRegistry, viewer_id: &str) -> Result<String, ClientError> {
    let status = registry.status(viewer_id).await?;
    Ok(format!(
        "switched to stream {} (stopped, type 'start' to play)",
        status.stream_name
    ))
}
