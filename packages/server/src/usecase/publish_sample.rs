//! UseCase: サンプル配信処理
//!
//! 配信時点のグループメンバー全員にサンプルを届けます。
//! 配信者自身がメンバーであれば配信者にも届きます（自己除外なし）。
//! 届かなかった宛先は MessagePusher 側で警告ログを出し、配信者にはエラーを返しません。

use std::sync::Arc;

use crate::domain::{GroupName, GroupRepository, MessagePusher, SubscriberId};

/// サンプル配信のユースケース
pub struct PublishSampleUseCase {
    /// Repository（グループテーブルの抽象化）
    repository: Arc<dyn GroupRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl PublishSampleUseCase {
    /// 新しい PublishSampleUseCase を作成
    pub fn new(
        repository: Arc<dyn GroupRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// サンプル配信を実行
    ///
    /// # Arguments
    ///
    /// * `group` - 配信先グループ
    /// * `message` - 配信する JSON 文字列（UI 層で組み立て済み）
    ///
    /// # Returns
    ///
    /// 配信対象となったメンバーの SubscriberId リスト（グループが存在しなければ空）
    pub async fn execute(&self, group: &GroupName, message: &str) -> Vec<SubscriberId> {
        let targets = self.repository.members(group).await;
        if targets.is_empty() {
            tracing::debug!("Group '{}' has no members, sample dropped", group);
            return targets;
        }

        let delivered = self
            .message_pusher
            .broadcast(targets.clone(), message)
            .await;
        tracing::debug!(
            "Published to group '{}': {}/{} delivered",
            group,
            delivered,
            targets.len()
        );
        targets
    }
}
