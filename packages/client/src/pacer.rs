//! Playback pacer: one sample per tick, rendered locally and published to the group.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ecg_live_server::domain::Sample;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    relay::{ConnectionState, RelayBinding},
    renderer::RollingWindow,
};

pub type SharedRenderer = Arc<Mutex<RollingWindow>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Stopped,
}

pub struct Pacer {
    tick_interval: Duration,
    samples: Arc<Vec<Sample>>,
    cursor: Arc<AtomicUsize>,
    state: PlaybackState,
    ticker: Option<JoinHandle<()>>,
    renderer: SharedRenderer,
}

impl Pacer {
    pub fn new(tick_interval: Duration, samples: Vec<Sample>, renderer: SharedRenderer) -> Self {
        Self {
            tick_interval,
            samples: Arc::new(samples),
            cursor: Arc::new(AtomicUsize::new(0)),
            state: PlaybackState::Idle,
            ticker: None,
            renderer,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the next sample to emit.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Start ticking. Refuses, with an error log and no state change, when the binding
    /// is missing or not connected, or when there is nothing to play.
    ///
    /// Returns whether playback is now running.
    pub fn start(&mut self, binding: Option<Arc<dyn RelayBinding>>, group: &str) -> bool {
        let Some(binding) = binding else {
            tracing::error!("No relay binding, cannot start playback");
            return false;
        };
        if binding.state() != ConnectionState::Connected {
            tracing::error!(
                "Relay binding is not connected (state: {:?}), cannot start playback",
                binding.state()
            );
            return false;
        }
        if self.samples.is_empty() {
            tracing::error!("No samples loaded, cannot start playback");
            return false;
        }

        if let Some(previous) = self.ticker.take() {
            tracing::warn!("Existing ticker replaced");
            previous.abort();
        }

        self.ticker = Some(spawn_ticker(
            self.tick_interval,
            self.samples.clone(),
            self.cursor.clone(),
            self.renderer.clone(),
            binding,
            group.to_string(),
        ));
        self.state = PlaybackState::Running;
        tracing::info!("Playback started for group '{}'", group);
        true
    }

    /// Stop ticking and move to `Stopped`, from any state. Idempotent.
    ///
    /// Waits for the cancelled ticker, so no tick touches the renderer after this returns.
    pub async fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            if let Err(e) = ticker.await
                && e.is_panic()
            {
                tracing::error!("Playback ticker panicked: {}", e);
            }
        }
        if self.state == PlaybackState::Running {
            tracing::info!("Playback stopped at cursor {}", self.cursor());
        }
        self.state = PlaybackState::Stopped;
    }

    /// Stop, swap in a new sequence and rewind. Playback stays stopped until `start`.
    pub async fn replace_samples(&mut self, samples: Vec<Sample>) {
        self.stop().await;
        self.samples = Arc::new(samples);
        self.cursor = Arc::new(AtomicUsize::new(0));
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn spawn_ticker(
    tick_interval: Duration,
    samples: Arc<Vec<Sample>>,
    cursor: Arc<AtomicUsize>,
    renderer: SharedRenderer,
    binding: Arc<dyn RelayBinding>,
    group: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let len = samples.len();

        loop {
            ticker.tick().await;

            let index = cursor.load(Ordering::Acquire) % len;
            let sample = samples[index];
            cursor.store((index + 1) % len, Ordering::Release);

            renderer.lock().await.render(sample);

            if let Err(e) = binding.publish(&group, sample).await {
                tracing::warn!("Failed to publish sample to '{}': {}", group, e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ChartLayout, relay::MockRelayBinding};
    use std::sync::Mutex as StdMutex;

    fn samples(values: &[i64]) -> Vec<Sample> {
        values.iter().map(|v| Sample::new(*v).unwrap()).collect()
    }

    fn renderer(capacity: usize) -> SharedRenderer {
        Arc::new(Mutex::new(
            RollingWindow::new(capacity, ChartLayout::default()).unwrap(),
        ))
    }

    /// A connected binding that records every publish.
    fn recording_binding(published: Arc<StdMutex<Vec<u16>>>) -> Arc<dyn RelayBinding> {
        let mut binding = MockRelayBinding::new();
        binding
            .expect_state()
            .returning(|| ConnectionState::Connected);
        binding.expect_publish().returning(move |_, sample| {
            published.lock().unwrap().push(sample.value());
            Ok(())
        });
        Arc::new(binding)
    }

    #[tokio::test]
    async fn test_start_without_binding_stays_idle() {
        // テスト項目: バインディングがない状態で start しても何も配信されず Idle のまま
        // given (前提条件):
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[500, 520, 600]),
            renderer(3),
        );

        // when (操作):
        let started = pacer.start(None, "g1");

        // then (期待する結果):
        assert!(!started);
        assert_eq!(pacer.state(), PlaybackState::Idle);
        assert_eq!(pacer.cursor(), 0);
    }

    #[tokio::test]
    async fn test_start_with_disconnected_binding_is_refused() {
        // テスト項目: 切断済みのバインディングでは start が拒否される
        // given (前提条件):
        let mut binding = MockRelayBinding::new();
        binding
            .expect_state()
            .returning(|| ConnectionState::Disconnected);
        binding.expect_publish().times(0);
        let mut pacer = Pacer::new(Duration::from_millis(8), samples(&[500]), renderer(3));

        // when (操作):
        let started = pacer.start(Some(Arc::new(binding)), "g1");

        // then (期待する結果):
        assert!(!started);
        assert_eq!(pacer.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_start_with_empty_sequence_is_refused() {
        // テスト項目: サンプルが空の場合 start が拒否される
        // given (前提条件):
        let published = Arc::new(StdMutex::new(Vec::new()));
        let mut pacer = Pacer::new(Duration::from_millis(8), Vec::new(), renderer(3));

        // when (操作):
        let started = pacer.start(Some(recording_binding(published.clone())), "g1");

        // then (期待する結果):
        assert!(!started);
        assert_eq!(pacer.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_emit_in_order_and_wrap() {
        // テスト項目: tick ごとに 1 サンプルずつ配信され、末尾で先頭に戻る
        // given (前提条件):
        let published = Arc::new(StdMutex::new(Vec::new()));
        let renderer = renderer(3);
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[500, 520, 600]),
            renderer.clone(),
        );

        // when (操作):
        assert!(pacer.start(Some(recording_binding(published.clone())), "g1"));
        // first tick fires immediately, then one every 8 ms
        tokio::time::sleep(Duration::from_millis(8 * 4 + 1)).await;
        pacer.stop().await;

        // then (期待する結果):
        assert_eq!(*published.lock().unwrap(), vec![500, 520, 600, 500, 520]);
        assert_eq!(pacer.cursor(), 2);
        assert_eq!(pacer.state(), PlaybackState::Stopped);
        assert_eq!(renderer.lock().await.write_cursor(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        // テスト項目: stop 後は tick が発生しない
        // given (前提条件):
        let published = Arc::new(StdMutex::new(Vec::new()));
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[500, 520, 600]),
            renderer(3),
        );
        assert!(pacer.start(Some(recording_binding(published.clone())), "g1"));
        tokio::time::sleep(Duration::from_millis(1)).await;

        // when (操作):
        pacer.stop().await;
        let count_at_stop = published.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert_eq!(published.lock().unwrap().len(), count_at_stop);
        pacer.stop().await;
        assert_eq!(pacer.state(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_ticker() {
        // テスト項目: 実行中の start はティッカーを置き換え、二重に tick しない
        // given (前提条件):
        let published = Arc::new(StdMutex::new(Vec::new()));
        let binding = recording_binding(published.clone());
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
            renderer(10),
        );
        assert!(pacer.start(Some(binding.clone()), "g1"));
        tokio::time::sleep(Duration::from_millis(1)).await;

        // when (操作):
        assert!(pacer.start(Some(binding), "g1"));
        tokio::time::sleep(Duration::from_millis(8 * 2 + 1)).await;
        pacer.stop().await;

        // then (期待する結果):
        assert_eq!(*published.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_does_not_stop_playback() {
        // テスト項目: 配信に失敗しても再生は続き、ローカル描画は進む
        // given (前提条件):
        let mut binding = MockRelayBinding::new();
        binding
            .expect_state()
            .returning(|| ConnectionState::Connected);
        binding
            .expect_publish()
            .returning(|_, _| Err(crate::error::ClientError::NotConnected));
        let renderer = renderer(10);
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[500, 520, 600]),
            renderer.clone(),
        );

        // when (操作):
        assert!(pacer.start(Some(Arc::new(binding)), "g1"));
        tokio::time::sleep(Duration::from_millis(8 * 2 + 1)).await;
        pacer.stop().await;

        // then (期待する結果):
        assert_eq!(renderer.lock().await.write_cursor(), 3);
    }

    #[tokio::test]
    async fn test_replace_samples_rewinds_and_stops() {
        // テスト項目: シーケンス差し替えでカーソルが 0 に戻り Stopped になる
        // given (前提条件):
        let mut pacer = Pacer::new(Duration::from_millis(8), samples(&[1, 2]), renderer(3));
        pacer.cursor.store(1, Ordering::Release);

        // when (操作):
        pacer.replace_samples(samples(&[7, 8, 9])).await;

        // then (期待する結果):
        assert_eq!(pacer.cursor(), 0);
        assert_eq!(pacer.sample_count(), 3);
        assert_eq!(pacer.state(), PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_from_idle_moves_to_stopped() {
        // テスト項目: 一度も開始していない状態で stop すると Stopped になる
        // given (前提条件):
        let mut pacer = Pacer::new(Duration::from_millis(8), samples(&[500]), renderer(3));
        assert_eq!(pacer.state(), PlaybackState::Idle);

        // when (操作):
        pacer.stop().await;
        pacer.stop().await;

        // then (期待する結果):
        assert_eq!(pacer.state(), PlaybackState::Stopped);
        assert_eq!(pacer.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_render_after_stop_returns() {
        // テスト項目: stop の完了後はティッカーが終了しており、リセット後の描画に割り込まない
        // given (前提条件):
        let published = Arc::new(StdMutex::new(Vec::new()));
        let renderer = renderer(3);
        let mut pacer = Pacer::new(
            Duration::from_millis(8),
            samples(&[500, 520, 600]),
            renderer.clone(),
        );
        assert!(pacer.start(Some(recording_binding(published.clone())), "g1"));
        tokio::time::sleep(Duration::from_millis(8 * 2 + 1)).await;

        // when (操作):
        pacer.stop().await;
        renderer.lock().await.reset();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert!(pacer.ticker.is_none());
        assert_eq!(renderer.lock().await.write_cursor(), 0);
    }
}
