//! Entities of the relay domain.

use serde::Serialize;

use super::value_object::{GroupName, SubscriberId, Timestamp};

/// A subscriber's membership in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: SubscriberId,
    pub joined_at: Timestamp,
}

impl Member {
    pub fn new(id: SubscriberId, joined_at: Timestamp) -> Self {
        Self { id, joined_at }
    }
}

/// A named set of subscribers that samples are routed to
///
/// Members are kept in join order and never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: GroupName,
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(name: GroupName) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    /// Add a member. Returns `false` if the subscriber was already a member,
    /// in which case the original join time is kept.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.contains(&member.id) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Remove a member. Returns `false` if the subscriber was not a member.
    pub fn remove_member(&mut self, id: &SubscriberId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.id != id);
        self.members.len() != before
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    pub fn member_ids(&self) -> Vec<SubscriberId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}
