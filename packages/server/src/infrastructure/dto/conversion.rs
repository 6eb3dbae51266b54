//! Conversion logic between domain entities and DTOs.

use ecg_live_shared::time::timestamp_to_rfc3339;

use crate::domain::{Group, Member, StreamEntry};
use crate::infrastructure::dto::http as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Group> for dto::GroupSummaryDto {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.as_str().to_string(),
            member_count: group.len(),
        }
    }
}

impl From<Member> for dto::MemberDetailDto {
    fn from(member: Member) -> Self {
        Self {
            subscriber_id: member.id.into_string(),
            joined_at: timestamp_to_rfc3339(member.joined_at.value()),
        }
    }
}

impl From<Group> for dto::GroupDetailDto {
    fn from(group: Group) -> Self {
        Self {
            name: group.name.into_string(),
            members: group.members.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<StreamEntry>> for dto::StreamListDto {
    fn from(entries: Vec<StreamEntry>) -> Self {
        Self {
            streams: entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| dto::StreamEntryDto {
                    index,
                    name: entry.name,
                    file_name: entry.file_name,
                })
                .collect(),
        }
    }
}
