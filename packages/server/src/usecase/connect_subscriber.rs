//! UseCase: 購読者接続処理
//!
//! 新しい接続に SubscriberId を割り当て、送信チャンネルを MessagePusher に登録します。
//! この時点ではどのグループにも参加していません。

use std::sync::Arc;

use crate::domain::{MessagePusher, PusherChannel, SubscriberId, SubscriberIdFactory};

/// 購読者接続のユースケース
pub struct ConnectSubscriberUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectSubscriberUseCase {
    /// 新しい ConnectSubscriberUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 購読者接続を実行
    ///
    /// # Returns
    ///
    /// 新しく割り当てた SubscriberId
    pub async fn execute(&self, sender: PusherChannel) -> SubscriberId {
        let subscriber_id = SubscriberIdFactory::generate();
        self.message_pusher
            .register_client(subscriber_id.clone(), sender)
            .await;
        subscriber_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;

    #[tokio::test]
    async fn test_connect_assigns_unique_ids_and_registers() {
        // テスト項目: 接続ごとに異なる ID が割り当てられ、送信チャンネルが登録される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let usecase = ConnectSubscriberUseCase::new(pusher.clone());
        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();

        // when (操作):
        let first = usecase.execute(tx1).await;
        let second = usecase.execute(tx2).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(pusher.client_count().await, 2);
    }

    #[tokio::test]
    async fn test_registered_channel_receives_pushes() {
        // テスト項目: 登録したチャンネルに ID 宛てのメッセージが届く
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let usecase = ConnectSubscriberUseCase::new(pusher.clone());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = usecase.execute(tx).await;

        // when (操作):
        let result = pusher.push_to(&id, "hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }
}
