//! UseCase: グループ一覧・詳細取得処理

use std::sync::Arc;

use crate::domain::{Group, GroupName, GroupRepository};

use super::error::GetGroupDetailError;

/// グループ一覧・詳細取得のユースケース
pub struct GetGroupsUseCase {
    /// Repository（グループテーブルの抽象化）
    repository: Arc<dyn GroupRepository>,
}

impl GetGroupsUseCase {
    /// 新しい GetGroupsUseCase を作成
    pub fn new(repository: Arc<dyn GroupRepository>) -> Self {
        Self { repository }
    }

    /// 現在メンバーのいるグループを名前順で返す
    pub async fn list(&self) -> Vec<Group> {
        self.repository.list_groups().await
    }

    /// グループ詳細を取得
    pub async fn detail(&self, group: &GroupName) -> Result<Group, GetGroupDetailError> {
        self.repository
            .get_group(group)
            .await
            .ok_or_else(|| GetGroupDetailError::GroupNotFound(group.as_str().to_string()))
    }
}
