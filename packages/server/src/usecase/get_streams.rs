//! UseCase: ストリーム一覧・ファイル取得処理

use std::sync::Arc;

use crate::domain::{StreamEntry, StreamStore, StreamStoreError};

use super::error::GetStreamFileError;

/// ストリーム一覧・ファイル取得のユースケース
pub struct GetStreamsUseCase {
    /// StreamStore（ストリームファイル置き場の抽象化）
    store: Arc<dyn StreamStore>,
}

impl GetStreamsUseCase {
    /// 新しい GetStreamsUseCase を作成
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self { store }
    }

    /// 利用可能なストリームをファイル名順で返す
    pub async fn list(&self) -> Result<Vec<StreamEntry>, GetStreamFileError> {
        self.store.list_streams().await.map_err(into_usecase_error)
    }

    /// ストリームファイルの中身をそのまま返す
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>, GetStreamFileError> {
        self.store
            .read_stream(file_name)
            .await
            .map_err(into_usecase_error)
    }
}

fn into_usecase_error(err: StreamStoreError) -> GetStreamFileError {
    match err {
        StreamStoreError::NotFound(name) => GetStreamFileError::NotFound(name),
        StreamStoreError::Io(e) => GetStreamFileError::Unavailable(e.to_string()),
    }
}
