//! UseCase: グループ離脱処理

use std::sync::Arc;

use crate::domain::{GroupName, GroupRepository, SubscriberId};

/// グループ離脱のユースケース
pub struct LeaveGroupUseCase {
    /// Repository（グループテーブルの抽象化）
    repository: Arc<dyn GroupRepository>,
}

impl LeaveGroupUseCase {
    /// 新しい LeaveGroupUseCase を作成
    pub fn new(repository: Arc<dyn GroupRepository>) -> Self {
        Self { repository }
    }

    /// グループ離脱を実行（冪等）
    ///
    /// # Returns
    ///
    /// メンバーだった場合は `true`、そうでなかった場合は `false`
    pub async fn execute(&self, group: &GroupName, subscriber_id: &SubscriberId) -> bool {
        let removed = self.repository.leave(group, subscriber_id).await;
        if removed {
            tracing::info!("Subscriber '{}' left group '{}'", subscriber_id, group);
        }
        removed
    }
}
