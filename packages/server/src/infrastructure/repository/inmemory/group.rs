//! InMemory Group Repository 実装
//!
//! ドメイン層が定義する GroupRepository trait の具体的な実装。
//! グループ名から購読者集合へのマップをインメモリで保持します。
//!
//! ## ロックの粒度
//!
//! - 外側の `RwLock`: グループの検索・作成・削除
//! - 内側の `Mutex`: グループごとのメンバー変更
//!
//! join / leave / members は外側の読み取りロックを保持したまま内側のロックを取るため、
//! 別グループへの操作は互いにブロックしません。
//! 空になったグループの削除だけが外側の書き込みロックを取り、削除直前に空であることを再確認します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Group, GroupName, GroupRepository, Member, SubscriberId, Timestamp};

type GroupTable = HashMap<GroupName, Arc<Mutex<Group>>>;

/// インメモリ Group Repository 実装
#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: RwLock<GroupTable>,
}

impl InMemoryGroupRepository {
    /// 新しい InMemoryGroupRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// グループが空であれば削除する
    async fn remove_if_empty(&self, name: &GroupName) {
        let mut groups = self.groups.write().await;
        let is_empty = match groups.get(name) {
            Some(group) => group.lock().await.is_empty(),
            None => false,
        };
        if is_empty {
            groups.remove(name);
            tracing::debug!("Group '{}' is empty and was removed", name);
        }
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn join(
        &self,
        group: &GroupName,
        subscriber: SubscriberId,
        joined_at: Timestamp,
    ) -> bool {
        // 既存グループへの参加は読み取りロックのみで行う
        {
            let groups = self.groups.read().await;
            if let Some(entry) = groups.get(group) {
                return entry.lock().await.add_member(Member::new(subscriber, joined_at));
            }
        }

        let mut groups = self.groups.write().await;
        let entry = groups
            .entry(group.clone())
            .or_insert_with(|| {
                tracing::debug!("Group '{}' created", group);
                Arc::new(Mutex::new(Group::new(group.clone())))
            })
            .clone();
        let added = entry.lock().await.add_member(Member::new(subscriber, joined_at));
        added
    }

    async fn leave(&self, group: &GroupName, subscriber: &SubscriberId) -> bool {
        let (removed, now_empty) = {
            let groups = self.groups.read().await;
            match groups.get(group) {
                Some(entry) => {
                    let mut g = entry.lock().await;
                    let removed = g.remove_member(subscriber);
                    (removed, g.is_empty())
                }
                None => (false, false),
            }
        };

        if now_empty {
            self.remove_if_empty(group).await;
        }
        removed
    }

    async fn leave_all(&self, subscriber: &SubscriberId) -> Vec<GroupName> {
        let mut left = Vec::new();
        {
            let groups = self.groups.read().await;
            for (name, entry) in groups.iter() {
                if entry.lock().await.remove_member(subscriber) {
                    left.push(name.clone());
                }
            }
        }

        for name in &left {
            self.remove_if_empty(name).await;
        }
        left.sort();
        left
    }

    async fn members(&self, group: &GroupName) -> Vec<SubscriberId> {
        let entry = self.groups.read().await.get(group).cloned();
        match entry {
            Some(entry) => {
                let g = entry.lock().await;
                g.member_ids()
            }
            None => Vec::new(),
        }
    }

    async fn get_group(&self, group: &GroupName) -> Option<Group> {
        let entry = self.groups.read().await.get(group).cloned()?;
        let g = entry.lock().await;
        Some(g.clone())
    }

    async fn list_groups(&self) -> Vec<Group> {
        let groups = self.groups.read().await;
        let mut result = Vec::with_capacity(groups.len());
        for entry in groups.values() {
            result.push(entry.lock().await.clone());
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}
