//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 購読者へのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信はチャンネルへの enqueue のみで、ソケットへの書き込みは接続ごとの送信タスクが行います。
//! そのため、同じ購読者への送信順序はチャンネルの順序と一致します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, SubscriberId};

/// 購読者 ID から送信チャンネルへのマップ
pub type ClientChannels = Arc<RwLock<HashMap<SubscriberId, PusherChannel>>>;

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new(Arc::new(RwLock::new(HashMap::new())));
/// pusher.register_client(subscriber_id.clone(), tx).await;
/// pusher.push_to(&subscriber_id, "{\"type\":\"sample\",...}").await?;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中の購読者の送信チャンネル
    clients: ClientChannels,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: ClientChannels) -> Self {
        Self { clients }
    }

    /// 登録済みの購読者数
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(RwLock::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, subscriber: SubscriberId, sender: PusherChannel) {
        let mut clients = self.clients.write().await;
        tracing::debug!("Subscriber '{}' registered to MessagePusher", subscriber);
        clients.insert(subscriber, sender);
    }

    async fn unregister_client(&self, subscriber: &SubscriberId) {
        let mut clients = self.clients.write().await;
        if clients.remove(subscriber).is_some() {
            tracing::debug!("Subscriber '{}' unregistered from MessagePusher", subscriber);
        }
    }

    async fn push_to(
        &self,
        subscriber: &SubscriberId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.read().await;

        let sender = clients
            .get(subscriber)
            .ok_or_else(|| MessagePushError::ClientNotFound(subscriber.as_str().to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn broadcast(&self, targets: Vec<SubscriberId>, content: &str) -> usize {
        let clients = self.clients.read().await;
        let mut delivered = 0;

        for target in targets {
            match clients.get(&target) {
                // 切断済みの購読者への配信は破棄する（再送しない）
                Some(sender) => match sender.send(content.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        tracing::warn!("Failed to push message to subscriber '{}': {}", target, e)
                    }
                },
                None => {
                    tracing::warn!("Subscriber '{}' not found during broadcast, skipping", target)
                }
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_to: 特定の購読者への送信
    // - broadcast: 複数購読者への送信と、部分失敗の許容
    //
    // 【どのようなシナリオをテストするか】
    // 1. push_to の成功ケース / 購読者が存在しないケース
    // 2. broadcast の成功ケース
    // 3. broadcast の部分失敗ケース（未登録・切断済みの購読者）
    // ========================================

    fn subscriber(id: &str) -> SubscriberId {
        SubscriberId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の購読者にメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(subscriber("alice"), tx).await;

        // when (操作):
        let result = pusher.push_to(&subscriber("alice"), "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しない購読者への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();

        // when (操作):
        let result = pusher.push_to(&subscriber("nonexistent"), "Hello").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MessagePushError::ClientNotFound("nonexistent".to_string()))
        );
    }

    #[tokio::test]
    async fn test_broadcast_success() {
        // テスト項目: 複数の購読者にメッセージをブロードキャストできる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register_client(subscriber("alice"), tx1).await;
        pusher.register_client(subscriber("bob"), tx2).await;

        // when (操作):
        let delivered = pusher
            .broadcast(vec![subscriber("alice"), subscriber("bob")], "700")
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await, Some("700".to_string()));
        assert_eq!(rx2.recv().await, Some("700".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: 未登録・切断済みの購読者がいても他の購読者には配信される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        pusher.register_client(subscriber("alice"), tx1).await;
        pusher.register_client(subscriber("gone"), tx2).await;
        drop(rx2);

        // when (操作):
        let delivered = pusher
            .broadcast(
                vec![subscriber("alice"), subscriber("gone"), subscriber("ghost")],
                "512",
            )
            .await;

        // then (期待する結果): alice にだけ配信される
        assert_eq!(delivered, 1);
        assert_eq!(rx1.recv().await, Some("512".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_client() {
        // テスト項目: 登録解除した購読者には送信できない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register_client(subscriber("alice"), tx).await;

        // when (操作):
        pusher.unregister_client(&subscriber("alice")).await;

        // then (期待する結果):
        assert_eq!(pusher.client_count().await, 0);
        assert!(pusher.push_to(&subscriber("alice"), "x").await.is_err());
    }
}
