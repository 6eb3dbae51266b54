//! Repository trait 定義
//!
//! グループの購読者テーブルへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Group, GroupName, SubscriberId, Timestamp};

/// Group Repository trait
///
/// 複数のセッションから同時に呼ばれるため、実装は内部で同期を取る必要があります。
/// 存在しないグループや購読者に対する操作はエラーにせず、何もしません。
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// 購読者をグループに追加（冪等）
    ///
    /// 新たに追加された場合は `true`、既に参加済みの場合は `false` を返す。
    async fn join(&self, group: &GroupName, subscriber: SubscriberId, joined_at: Timestamp)
    -> bool;

    /// 購読者をグループから削除（冪等）
    ///
    /// 削除された場合は `true`、参加していなかった場合は `false` を返す。
    async fn leave(&self, group: &GroupName, subscriber: &SubscriberId) -> bool;

    /// 購読者を全てのグループから削除し、離脱したグループ名を返す
    async fn leave_all(&self, subscriber: &SubscriberId) -> Vec<GroupName>;

    /// 現時点でのグループのメンバー ID を取得（存在しない場合は空）
    async fn members(&self, group: &GroupName) -> Vec<SubscriberId>;

    /// グループを取得
    async fn get_group(&self, group: &GroupName) -> Option<Group>;

    /// 全てのグループを名前順で取得
    async fn list_groups(&self) -> Vec<Group>;
}
