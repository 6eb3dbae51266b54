//! UseCase 層: リレーの操作単位
//!
//! UI 層（WebSocket / HTTP ハンドラ）はこの層のみに依存し、
//! ドメイン層の trait を通してインフラストラクチャを利用します。

pub mod connect_subscriber;
pub mod disconnect_subscriber;
pub mod error;
pub mod get_groups;
pub mod get_streams;
pub mod join_group;
pub mod leave_group;
pub mod publish_sample;

pub use connect_subscriber::ConnectSubscriberUseCase;
pub use disconnect_subscriber::DisconnectSubscriberUseCase;
pub use error::{GetGroupDetailError, GetStreamFileError};
pub use get_groups::GetGroupsUseCase;
pub use get_streams::GetStreamsUseCase;
pub use join_group::JoinGroupUseCase;
pub use leave_group::LeaveGroupUseCase;
pub use publish_sample::PublishSampleUseCase;
