//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectSubscriberUseCase, DisconnectSubscriberUseCase, GetGroupsUseCase, GetStreamsUseCase,
    JoinGroupUseCase, LeaveGroupUseCase, PublishSampleUseCase,
};

/// Shared application state
///
/// ハンドラは UseCase 層のみを参照します。
pub struct AppState {
    /// ConnectSubscriberUseCase（購読者接続のユースケース）
    pub connect_subscriber_usecase: Arc<ConnectSubscriberUseCase>,
    /// DisconnectSubscriberUseCase（購読者切断のユースケース）
    pub disconnect_subscriber_usecase: Arc<DisconnectSubscriberUseCase>,
    /// JoinGroupUseCase（グループ参加のユースケース）
    pub join_group_usecase: Arc<JoinGroupUseCase>,
    /// LeaveGroupUseCase（グループ離脱のユースケース）
    pub leave_group_usecase: Arc<LeaveGroupUseCase>,
    /// PublishSampleUseCase（サンプル配信のユースケース）
    pub publish_sample_usecase: Arc<PublishSampleUseCase>,
    /// GetGroupsUseCase（グループ一覧・詳細取得のユースケース）
    pub get_groups_usecase: Arc<GetGroupsUseCase>,
    /// GetStreamsUseCase（ストリーム一覧・ファイル取得のユースケース）
    pub get_streams_usecase: Arc<GetStreamsUseCase>,
}
