//! UseCase: グループ参加処理

use std::sync::Arc;

use ecg_live_shared::time::Clock;

use crate::domain::{GroupName, GroupRepository, SubscriberId, Timestamp};

/// グループ参加のユースケース
pub struct JoinGroupUseCase {
    /// Repository（グループテーブルの抽象化）
    repository: Arc<dyn GroupRepository>,
    /// 参加時刻の取得に使う時計
    clock: Arc<dyn Clock>,
}

impl JoinGroupUseCase {
    /// 新しい JoinGroupUseCase を作成
    pub fn new(repository: Arc<dyn GroupRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// グループ参加を実行（冪等）
    ///
    /// # Returns
    ///
    /// 新たに参加した場合は `true`、既に参加済みだった場合は `false`
    pub async fn execute(&self, group: &GroupName, subscriber_id: SubscriberId) -> bool {
        let joined_at = Timestamp::new(self.clock.now_millis());
        let added = self
            .repository
            .join(group, subscriber_id.clone(), joined_at)
            .await;
        if added {
            tracing::info!("Subscriber '{}' joined group '{}'", subscriber_id, group);
        } else {
            tracing::debug!(
                "Subscriber '{}' is already a member of group '{}'",
                subscriber_id,
                group
            );
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryGroupRepository;
    use ecg_live_shared::time::FixedClock;

    #[tokio::test]
    async fn test_join_records_clock_time() {
        // テスト項目: 参加時刻として時計の値が記録される
        // given (前提条件):
        let repository = Arc::new(InMemoryGroupRepository::new());
        let usecase =
            JoinGroupUseCase::new(repository.clone(), Arc::new(FixedClock::new(42_000)));
        let g1 = GroupName::new("g1".to_string()).unwrap();

        // when (操作):
        let added = usecase
            .execute(&g1, SubscriberId::new("alice".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(added);
        let group = repository.get_group(&g1).await.unwrap();
        assert_eq!(group.members[0].joined_at, Timestamp::new(42_000));
    }

    #[tokio::test]
    async fn test_join_twice_is_not_an_error() {
        // テスト項目: 重複した参加はエラーにならず false を返す
        // given (前提条件):
        let repository = Arc::new(InMemoryGroupRepository::new());
        let usecase = JoinGroupUseCase::new(repository.clone(), Arc::new(FixedClock::new(0)));
        let g1 = GroupName::new("g1".to_string()).unwrap();
        let alice = SubscriberId::new("alice".to_string()).unwrap();
        usecase.execute(&g1, alice.clone()).await;

        // when (操作):
        let added = usecase.execute(&g1, alice).await;

        // then (期待する結果):
        assert!(!added);
        assert_eq!(repository.members(&g1).await.len(), 1);
    }
}
