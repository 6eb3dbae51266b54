//! UseCase: 購読者切断処理
//!
//! 切断した購読者を全てのグループから外し、送信チャンネルの登録を解除します。
//! 何度呼んでも結果は同じです（冪等）。

use std::sync::Arc;

use crate::domain::{GroupName, GroupRepository, MessagePusher, SubscriberId};

/// 購読者切断のユースケース
pub struct DisconnectSubscriberUseCase {
    /// Repository（グループテーブルの抽象化）
    repository: Arc<dyn GroupRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSubscriberUseCase {
    /// 新しい DisconnectSubscriberUseCase を作成
    pub fn new(
        repository: Arc<dyn GroupRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 購読者切断を実行
    ///
    /// # Returns
    ///
    /// 購読者が離脱したグループ名のリスト
    pub async fn execute(&self, subscriber_id: &SubscriberId) -> Vec<GroupName> {
        let left = self.repository.leave_all(subscriber_id).await;
        self.message_pusher.unregister_client(subscriber_id).await;
        left
    }
}
