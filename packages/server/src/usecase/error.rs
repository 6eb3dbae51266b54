//! UseCase 層のエラー型

use thiserror::Error;

/// グループ詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetGroupDetailError {
    /// グループが存在しない（メンバーがいない）
    #[error("Group '{0}' not found")]
    GroupNotFound(String),
}

/// ストリーム取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetStreamFileError {
    /// ストリームファイルが存在しない
    #[error("Stream '{0}' not found")]
    NotFound(String),

    /// ストアにアクセスできない
    #[error("Stream store unavailable: {0}")]
    Unavailable(String),
}
