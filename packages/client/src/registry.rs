//! Viewers keyed by viewer id.
//!
//! This is the inbound control surface: each operation looks up the viewer's session
//! and forwards to it. Sessions of different viewers never share state.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};

use crate::{
    config::PlaybackConfig,
    error::ClientError,
    reconnect::ReconnectPolicy,
    relay::{RelayConnector, WebSocketConnector, websocket::DEFAULT_CONNECT_TIMEOUT},
    session::{SessionStatus, ViewerSession},
    source::{HttpSampleSource, SampleSource},
};

type SharedSession = Arc<Mutex<ViewerSession>>;

pub struct ViewerRegistry {
    config: PlaybackConfig,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl ViewerRegistry {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            policy: ReconnectPolicy::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Initialise a viewer against a relay server at `base_address`.
    pub async fn init(
        &self,
        viewer_id: &str,
        base_address: &str,
        stream_index: usize,
    ) -> Result<(), ClientError> {
        let source = Arc::new(HttpSampleSource::new(base_address));
        let connector = Arc::new(
            WebSocketConnector::new(base_address)?
                .with_connect_timeout(self.connect_timeout)
                .with_policy(self.policy),
        );
        self.init_with(viewer_id, source, connector, stream_index)
            .await
    }

    /// Initialise a viewer with explicit collaborators.
    pub async fn init_with(
        &self,
        viewer_id: &str,
        source: Arc<dyn SampleSource>,
        connector: Arc<dyn RelayConnector>,
        stream_index: usize,
    ) -> Result<(), ClientError> {
        if self.sessions.read().await.contains_key(viewer_id) {
            return Err(ClientError::DuplicateViewer(viewer_id.to_string()));
        }

        let mut session = ViewerSession::init(
            viewer_id,
            source,
            connector,
            stream_index,
            self.config.clone(),
        )
        .await?;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(viewer_id) {
            // lost a race with a concurrent init for the same id
            drop(sessions);
            session.teardown().await;
            return Err(ClientError::DuplicateViewer(viewer_id.to_string()));
        }
        sessions.insert(viewer_id.to_string(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    async fn session(&self, viewer_id: &str) -> Result<SharedSession, ClientError> {
        self.sessions
            .read()
            .await
            .get(viewer_id)
            .cloned()
            .ok_or_else(|| ClientError::ViewerNotFound(viewer_id.to_string()))
    }

    /// Returns whether playback is running afterwards.
    pub async fn start(&self, viewer_id: &str) -> Result<bool, ClientError> {
        let session = self.session(viewer_id).await?;
        let started = session.lock().await.start();
        Ok(started)
    }

    pub async fn stop(&self, viewer_id: &str) -> Result<(), ClientError> {
        let session = self.session(viewer_id).await?;
        session.lock().await.stop().await;
        Ok(())
    }

    pub async fn switch_stream(&self, viewer_id: &str, index: usize) -> Result<(), ClientError> {
        let session = self.session(viewer_id).await?;
        let mut session = session.lock().await;
        session.switch_stream(index).await
    }

    pub async fn next_stream(&self, viewer_id: &str) -> Result<bool, ClientError> {
        let session = self.session(viewer_id).await?;
        let mut session = session.lock().await;
        session.next_stream().await
    }

    pub async fn previous_stream(&self, viewer_id: &str) -> Result<bool, ClientError> {
        let session = self.session(viewer_id).await?;
        let mut session = session.lock().await;
        session.previous_stream().await
    }

    /// Tear the viewer down and forget it; the id can be initialised again afterwards.
    pub async fn teardown(&self, viewer_id: &str) -> Result<(), ClientError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(viewer_id)
            .ok_or_else(|| ClientError::ViewerNotFound(viewer_id.to_string()))?;
        session.lock().await.teardown().await;
        Ok(())
    }

    pub async fn teardown_all(&self) {
        let sessions: Vec<SharedSession> = self
            .sessions
            .write()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect();
        for session in sessions {
            session.lock().await.teardown().await;
        }
    }

    /// Current chart as an SVG document.
    pub async fn snapshot(&self, viewer_id: &str) -> Result<String, ClientError> {
        let session = self.session(viewer_id).await?;
        let svg = session.lock().await.snapshot().await;
        Ok(svg)
    }

    pub async fn status(&self, viewer_id: &str) -> Result<SessionStatus, ClientError> {
        let session = self.session(viewer_id).await?;
        let status = session.lock().await.status().await;
        Ok(status)
    }

    pub async fn streams(&self, viewer_id: &str) -> Result<(Vec<String>, usize), ClientError> {
        let session = self.session(viewer_id).await?;
        let session = session.lock().await;
        Ok((session.streams().to_vec(), session.current_stream()))
    }

    pub async fn viewer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pacer::PlaybackState,
        relay::{InProcessConnector, InProcessRelay},
        source::MockSampleSource,
    };
    use ecg_live_server::domain::Sample;

    fn source() -> Arc<dyn SampleSource> {
        let mut source = MockSampleSource::new();
        source
            .expect_list_streams()
            .returning(|| Ok(vec!["100.ecg".to_string()]));
        source
            .expect_load_stream()
            .returning(|_| Ok(vec![Sample::BASELINE; 4]));
        Arc::new(source)
    }

    fn registry() -> ViewerRegistry {
        ViewerRegistry::new(PlaybackConfig {
            capacity: 10,
            ..PlaybackConfig::default()
        })
    }

    #[tokio::test]
    async fn test_duplicate_init_is_rejected() {
        // テスト項目: 同じビューア ID の二重 init は DuplicateViewer になる
        // given (前提条件):
        let registry = registry();
        let relay = Arc::new(InProcessRelay::new());
        let connector = Arc::new(InProcessConnector::new(relay));
        registry
            .init_with("ecg-chart", source(), connector.clone(), 0)
            .await
            .unwrap();

        // when (操作):
        let result = registry
            .init_with("ecg-chart", source(), connector, 0)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ClientError::DuplicateViewer("ecg-chart".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_viewer_is_not_found() {
        // テスト項目: 存在しないビューアへの操作は ViewerNotFound になる
        // given (前提条件):
        let registry = registry();

        // when (操作):
        let start = registry.start("nobody").await;
        let teardown = registry.teardown("nobody").await;

        // then (期待する結果):
        assert_eq!(start, Err(ClientError::ViewerNotFound("nobody".to_string())));
        assert_eq!(
            teardown,
            Err(ClientError::ViewerNotFound("nobody".to_string()))
        );
    }

    #[tokio::test]
    async fn test_viewers_are_independent() {
        // テスト項目: 複数のビューアは互いの再生状態に影響しない
        // given (前提条件):
        let registry = registry();
        let relay = Arc::new(InProcessRelay::new());
        let connector = Arc::new(InProcessConnector::new(relay.clone()));
        registry
            .init_with("chart-a", source(), connector.clone(), 0)
            .await
            .unwrap();
        registry
            .init_with("chart-b", source(), connector, 0)
            .await
            .unwrap();

        // when (操作):
        let started = registry.start("chart-a").await.unwrap();

        // then (期待する結果):
        assert!(started);
        assert_eq!(
            registry.status("chart-a").await.unwrap().state,
            PlaybackState::Running
        );
        assert_eq!(
            registry.status("chart-b").await.unwrap().state,
            PlaybackState::Idle
        );
        assert_eq!(registry.viewer_ids().await, vec!["chart-a", "chart-b"]);
        registry.teardown_all().await;
        assert!(relay.group_members("chart-a").await.is_empty());
    }

    #[tokio::test]
    async fn test_teardown_allows_reinit() {
        // テスト項目: teardown 後は同じ ID で再度 init できる
        // given (前提条件):
        let registry = registry();
        let relay = Arc::new(InProcessRelay::new());
        let connector = Arc::new(InProcessConnector::new(relay));
        registry
            .init_with("ecg-chart", source(), connector.clone(), 0)
            .await
            .unwrap();

        // when (操作):
        registry.teardown("ecg-chart").await.unwrap();
        let result = registry
            .init_with("ecg-chart", source(), connector, 0)
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_init_with_bad_base_address_fails() {
        // テスト項目: 未対応のベースアドレスでは init が InvalidConfig になる
        // given (前提条件):
        let registry = registry();

        // when (操作):
        let result = registry.init("ecg-chart", "ftp://example.com/", 0).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }
}
