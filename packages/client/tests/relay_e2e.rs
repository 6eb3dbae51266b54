//! End-to-end tests against a real relay server bound to an ephemeral port.

use std::{collections::HashMap, sync::Arc, time::Duration};

use ecg_live_client::{
    PlaybackConfig, PlaybackState, ViewerRegistry,
    reconnect::ReconnectPolicy,
    relay::{ConnectionState, ReceivedSample, RelayBinding, RelayConnector, WebSocketConnector},
};
use ecg_live_server::{
    domain::Sample,
    infrastructure::{
        dto::http::{GroupDetailDto, GroupSummaryDto, StreamListDto},
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryGroupRepository,
        stream_store::FsStreamStore,
    },
    ui::Server,
    usecase::{
        ConnectSubscriberUseCase, DisconnectSubscriberUseCase, GetGroupsUseCase,
        GetStreamsUseCase, JoinGroupUseCase, LeaveGroupUseCase, PublishSampleUseCase,
    },
};
use ecg_live_shared::time::SystemClock;
use tempfile::TempDir;
use tokio::{
    net::TcpListener,
    sync::{RwLock, mpsc},
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    base_url: String,
    _data_dir: TempDir,
}

async fn spawn_server() -> TestServer {
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(data_dir.path().join("100.ecg"), "500\n520\n600\n580\n").unwrap();
    std::fs::write(data_dir.path().join("101.ecg"), "100\n200\n300\n").unwrap();

    let repository = Arc::new(InMemoryGroupRepository::new());
    let stream_store = Arc::new(FsStreamStore::new(data_dir.path()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(RwLock::new(
        HashMap::new(),
    ))));

    let server = Server::new(
        Arc::new(ConnectSubscriberUseCase::new(message_pusher.clone())),
        Arc::new(DisconnectSubscriberUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        Arc::new(JoinGroupUseCase::new(
            repository.clone(),
            Arc::new(SystemClock),
        )),
        Arc::new(LeaveGroupUseCase::new(repository.clone())),
        Arc::new(PublishSampleUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        )),
        Arc::new(GetGroupsUseCase::new(repository.clone())),
        Arc::new(GetStreamsUseCase::new(stream_store)),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener, std::future::pending()));

    TestServer {
        base_url: format!("http://{}/", addr),
        _data_dir: data_dir,
    }
}

async fn connect(server: &TestServer) -> Arc<dyn RelayBinding> {
    WebSocketConnector::new(&server.base_url)
        .unwrap()
        .with_policy(ReconnectPolicy::no_retry())
        .connect()
        .await
        .unwrap()
}

async fn attach(binding: &Arc<dyn RelayBinding>) -> mpsc::UnboundedReceiver<ReceivedSample> {
    let (tx, rx) = mpsc::unbounded_channel();
    binding.attach_handler(tx).await;
    rx
}

#[tokio::test]
async fn test_http_routes() {
    // テスト項目: HTTP API がヘルスチェック・ストリーム一覧・ファイルを返す
    // given (前提条件):
    let server = spawn_server().await;
    let http = reqwest::Client::new();

    // when (操作):
    let health = http
        .get(format!("{}api/health", server.base_url))
        .send()
        .await
        .unwrap();
    let streams: StreamListDto = http
        .get(format!("{}api/streams", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let file = http
        .get(format!("{}EcgData/100.ecg", server.base_url))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    let names: Vec<&str> = streams.streams.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(names, vec!["100.ecg", "101.ecg"]);
    assert_eq!(file.status(), reqwest::StatusCode::OK);
    assert_eq!(file.text().await.unwrap(), "500\n520\n600\n580\n");
}

#[tokio::test]
async fn test_missing_or_escaping_stream_file_is_not_found() {
    // テスト項目: 存在しないファイルやディレクトリ外を指す名前は 404 になる
    // given (前提条件):
    let server = spawn_server().await;
    let http = reqwest::Client::new();

    for name in ["999.ecg", "..%2F100.ecg"] {
        // when (操作):
        let response = http
            .get(format!("{}EcgData/{}", server.base_url, name))
            .send()
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{}", name);
    }
}

#[tokio::test]
async fn test_publish_reaches_group_members_only() {
    // テスト項目: join(A,g1), join(B,g1), publish(g1,700) で A と B に届き C には届かない
    // given (前提条件):
    let server = spawn_server().await;
    let a = connect(&server).await;
    let b = connect(&server).await;
    let c = connect(&server).await;
    let mut rx_a = attach(&a).await;
    let mut rx_b = attach(&b).await;
    let mut rx_c = attach(&c).await;
    a.join("g1").await.unwrap();
    b.join("g1").await.unwrap();

    // when (操作):
    a.publish("g1", Sample::new(700).unwrap()).await.unwrap();

    // then (期待する結果):
    let got_a = timeout(WAIT, rx_a.recv()).await.unwrap().unwrap();
    let got_b = timeout(WAIT, rx_b.recv()).await.unwrap().unwrap();
    assert_eq!(got_a.value.value(), 700);
    assert_eq!(got_b.value.value(), 700);
    assert_eq!(got_b.group, "g1");
    assert_eq!(got_b.publisher, a.subscriber_id());
    assert!(
        timeout(Duration::from_millis(200), rx_c.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_group_api_reflects_membership() {
    // テスト項目: グループ API が参加・切断に追従する
    // given (前提条件):
    let server = spawn_server().await;
    let http = reqwest::Client::new();
    let a = connect(&server).await;
    a.join("ward-3").await.unwrap();

    // when (操作):
    let groups: Vec<GroupSummaryDto> = http
        .get(format!("{}api/groups", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let detail: GroupDetailDto = http
        .get(format!("{}api/groups/ward-3", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    a.close().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after_close = http
        .get(format!("{}api/groups/ward-3", server.base_url))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(
        groups,
        vec![GroupSummaryDto {
            name: "ward-3".to_string(),
            member_count: 1,
        }]
    );
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.members[0].subscriber_id, a.subscriber_id());
    assert_eq!(a.state(), ConnectionState::Disconnected);
    assert_eq!(after_close.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_plays_into_its_group() {
    // テスト項目: ビューアの再生サンプルが同じグループの他の接続に届く
    // given (前提条件):
    let server = spawn_server().await;
    let registry = ViewerRegistry::new(PlaybackConfig {
        tick_interval: Duration::from_millis(5),
        capacity: 10,
        ..PlaybackConfig::default()
    })
    .with_policy(ReconnectPolicy::no_retry());
    registry.init("ecg-chart", &server.base_url, 0).await.unwrap();
    let observer = connect(&server).await;
    let mut rx = attach(&observer).await;
    observer.join("ecg-chart").await.unwrap();

    // when (操作):
    let started = registry.start("ecg-chart").await.unwrap();
    let mut received = Vec::new();
    for _ in 0..3 {
        let sample = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        received.push(sample.value.value());
    }

    // then (期待する結果):
    assert!(started);
    assert_eq!(received, vec![500, 520, 600]);
    let status = registry.status("ecg-chart").await.unwrap();
    assert_eq!(status.state, PlaybackState::Running);
    assert_eq!(status.connection, Some(ConnectionState::Connected));

    registry.teardown("ecg-chart").await.unwrap();
    assert!(registry.viewer_ids().await.is_empty());
}
