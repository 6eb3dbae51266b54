//! Viewer session: binds one viewer to its relay group and owns its playback.

use std::sync::Arc;

use ecg_live_server::domain::GroupName;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::{
    config::PlaybackConfig,
    error::ClientError,
    pacer::{Pacer, PlaybackState, SharedRenderer},
    relay::{ConnectionState, ReceivedSample, RelayBinding, RelayConnector},
    renderer::RollingWindow,
    source::{SampleSource, StreamSelection},
};

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub viewer_id: String,
    pub state: PlaybackState,
    pub connection: Option<ConnectionState>,
    pub subscriber_id: Option<String>,
    pub stream_index: usize,
    pub stream_count: usize,
    pub stream_name: String,
    pub cursor: usize,
    pub sample_count: usize,
    pub write_cursor: usize,
}

pub struct ViewerSession {
    viewer_id: String,
    source: Arc<dyn SampleSource>,
    connector: Arc<dyn RelayConnector>,
    selection: StreamSelection,
    pacer: Pacer,
    renderer: SharedRenderer,
    binding: Option<Arc<dyn RelayBinding>>,
    receive_task: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl ViewerSession {
    /// Load the selected stream, bind to the relay and join the viewer's group.
    ///
    /// A relay that cannot be reached does not fail `init`: the session stays unbound
    /// and `start` refuses. A bad index or a missing stream fails before anything is
    /// created.
    pub async fn init(
        viewer_id: &str,
        source: Arc<dyn SampleSource>,
        connector: Arc<dyn RelayConnector>,
        stream_index: usize,
        config: PlaybackConfig,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        GroupName::new(viewer_id.to_string())
            .map_err(|e| ClientError::InvalidConfig(format!("viewer id: {}", e)))?;

        let streams = source.list_streams().await?;
        let selection = StreamSelection::new(streams, stream_index)?;
        let samples = source.load_stream(selection.current_file()).await?;
        tracing::info!(
            "Viewer '{}' loaded stream '{}' ({} samples)",
            viewer_id,
            selection.current_name(),
            samples.len()
        );

        let renderer = Arc::new(Mutex::new(RollingWindow::new(
            config.capacity,
            config.layout,
        )?));
        let pacer = Pacer::new(config.tick_interval, samples, renderer.clone());

        let mut session = Self {
            viewer_id: viewer_id.to_string(),
            source,
            connector,
            selection,
            pacer,
            renderer,
            binding: None,
            receive_task: None,
            torn_down: false,
        };
        session.bind().await;
        Ok(session)
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    /// The viewer's relay group is named after the viewer.
    pub fn group(&self) -> &str {
        &self.viewer_id
    }

    pub fn state(&self) -> PlaybackState {
        self.pacer.state()
    }

    pub fn streams(&self) -> &[String] {
        self.selection.streams()
    }

    pub fn current_stream(&self) -> usize {
        self.selection.current_index()
    }

    pub fn renderer(&self) -> SharedRenderer {
        self.renderer.clone()
    }

    pub fn start(&mut self) -> bool {
        if self.torn_down {
            tracing::error!("Viewer '{}' is torn down, cannot start", self.viewer_id);
            return false;
        }
        self.pacer.start(self.binding.clone(), &self.viewer_id)
    }

    pub async fn stop(&mut self) {
        self.pacer.stop().await;
    }

    /// Switch to another stream.
    ///
    /// The new samples are loaded first; if that fails the session is unchanged.
    /// Afterwards playback is stopped at cursor 0 on a fresh baseline and a new binding
    /// replaces the old one.
    pub async fn switch_stream(&mut self, index: usize) -> Result<(), ClientError> {
        self.ensure_live()?;
        let file = self.selection.resolve(index)?.to_string();
        let samples = self.source.load_stream(&file).await?;

        self.pacer.replace_samples(samples).await;
        self.selection.select(index)?;
        self.renderer.lock().await.reset();
        tracing::info!(
            "Viewer '{}' switched to stream '{}'",
            self.viewer_id,
            self.selection.current_name()
        );

        self.unbind(false).await;
        self.bind().await;
        Ok(())
    }

    /// Move to the next stream. Returns `false` when already at the last one.
    pub async fn next_stream(&mut self) -> Result<bool, ClientError> {
        self.ensure_live()?;
        match self.selection.next_index() {
            Some(index) => self.switch_stream(index).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Move to the previous stream. Returns `false` when already at the first one.
    pub async fn previous_stream(&mut self) -> Result<bool, ClientError> {
        self.ensure_live()?;
        match self.selection.previous_index() {
            Some(index) => self.switch_stream(index).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Stop playback, leave the group and close the binding.
    ///
    /// Every step runs even if an earlier one fails. Idempotent.
    pub async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.pacer.stop().await;
        self.unbind(true).await;
        self.torn_down = true;
        tracing::info!("Viewer '{}' torn down", self.viewer_id);
    }

    pub async fn snapshot(&self) -> String {
        self.renderer.lock().await.to_svg()
    }

    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            viewer_id: self.viewer_id.clone(),
            state: self.pacer.state(),
            connection: self.binding.as_ref().map(|b| b.state()),
            subscriber_id: self.binding.as_ref().map(|b| b.subscriber_id()),
            stream_index: self.selection.current_index(),
            stream_count: self.selection.streams().len(),
            stream_name: self.selection.current_name().to_string(),
            cursor: self.pacer.cursor(),
            sample_count: self.pacer.sample_count(),
            write_cursor: self.renderer.lock().await.write_cursor(),
        }
    }

    fn ensure_live(&self) -> Result<(), ClientError> {
        if self.torn_down {
            return Err(ClientError::SessionClosed(self.viewer_id.clone()));
        }
        Ok(())
    }

    /// Connect, join the group and attach the receive handler. Failures leave the
    /// session unbound.
    async fn bind(&mut self) {
        let binding = match self.connector.connect().await {
            Ok(binding) => binding,
            Err(e) => {
                tracing::error!("Viewer '{}' could not connect: {}", self.viewer_id, e);
                return;
            }
        };

        if let Err(e) = binding.join(&self.viewer_id).await {
            tracing::error!(
                "Viewer '{}' could not join its group: {}",
                self.viewer_id,
                e
            );
            if let Err(e) = binding.close().await {
                tracing::warn!("Failed to close binding: {}", e);
            }
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        binding.attach_handler(tx).await;
        self.receive_task = Some(spawn_receive_task(
            rx,
            self.renderer.clone(),
            binding.subscriber_id(),
        ));
        self.binding = Some(binding);
    }

    async fn unbind(&mut self, leave_group: bool) {
        if let Some(task) = self.receive_task.take() {
            task.abort();
        }
        let Some(binding) = self.binding.take() else {
            return;
        };

        binding.detach_handler().await;
        if leave_group && let Err(e) = binding.leave(&self.viewer_id).await {
            tracing::warn!(
                "Viewer '{}' failed to leave its group: {}",
                self.viewer_id,
                e
            );
        }
        if let Err(e) = binding.close().await {
            tracing::warn!("Viewer '{}' failed to close binding: {}", self.viewer_id, e);
        }
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        if let Some(task) = self.receive_task.take() {
            task.abort();
        }
    }
}

/// Draw samples published by other connections in the group.
///
/// Own publications come back from the relay too; they were already drawn by the pacer
/// and are skipped.
fn spawn_receive_task(
    mut rx: mpsc::UnboundedReceiver<ReceivedSample>,
    renderer: SharedRenderer,
    own_subscriber_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(sample) = rx.recv().await {
            if sample.publisher == own_subscriber_id {
                continue;
            }
            tracing::debug!(
                "Received sample {} from '{}'",
                sample.value.value(),
                sample.publisher
            );
            renderer.lock().await.render(sample.value);
        }
    })
}
