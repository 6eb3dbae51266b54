//! StreamStore trait 定義
//!
//! 録画済み ECG ファイルの一覧と読み出しのインターフェース。

use async_trait::async_trait;
use serde::Serialize;

use super::StreamStoreError;

/// 利用可能なストリーム（ECG ファイル）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamEntry {
    /// 拡張子なしの表示名（例: `100`）
    pub name: String,
    /// ファイル名（例: `100.ecg`）
    pub file_name: String,
}

/// StreamStore trait
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// ファイル名順のストリーム一覧を取得
    async fn list_streams(&self) -> Result<Vec<StreamEntry>, StreamStoreError>;

    /// ストリームファイルの生データを取得
    ///
    /// 存在しない場合は `StreamStoreError::NotFound` を返す。
    async fn read_stream(&self, file_name: &str) -> Result<Vec<u8>, StreamStoreError>;
}
