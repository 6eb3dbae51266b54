//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Group summary for `GET /api/groups`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummaryDto {
    pub name: String,
    pub member_count: usize,
}

/// Member detail (joined_at in RFC 3339)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDetailDto {
    pub subscriber_id: String,
    pub joined_at: String,
}

/// Group detail for `GET /api/groups/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetailDto {
    pub name: String,
    pub members: Vec<MemberDetailDto>,
}

/// One stream entry; `index` is the position used to select the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntryDto {
    pub index: usize,
    pub name: String,
    pub file_name: String,
}

/// Stream list for `GET /api/streams`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamListDto {
    pub streams: Vec<StreamEntryDto>,
}
