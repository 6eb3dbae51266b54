//! ファイルシステム上の ECG ファイルを扱う StreamStore 実装
//!
//! データディレクトリ直下の `*.ecg` ファイルをストリームとして扱います。
//! ディレクトリが存在しない場合はストリームなしとして扱います。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{StreamEntry, StreamStore, StreamStoreError};

/// ストリームファイルの拡張子
pub const STREAM_FILE_EXTENSION: &str = "ecg";

/// ファイルシステム StreamStore
#[derive(Debug, Clone)]
pub struct FsStreamStore {
    data_dir: PathBuf,
}

impl FsStreamStore {
    /// 新しい FsStreamStore を作成
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// ディレクトリ外を指すファイル名を拒否する
    fn is_plain_file_name(file_name: &str) -> bool {
        !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\'])
    }
}

#[async_trait]
impl StreamStore for FsStreamStore {
    async fn list_streams(&self) -> Result<Vec<StreamEntry>, StreamStoreError> {
        let mut dir = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Data directory '{}' does not exist, no streams available",
                    self.data_dir.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(STREAM_FILE_EXTENSION) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let (Some(file_name), Some(name)) = (
                path.file_name().and_then(|n| n.to_str()),
                path.file_stem().and_then(|n| n.to_str()),
            ) else {
                continue;
            };
            entries.push(StreamEntry {
                name: name.to_string(),
                file_name: file_name.to_string(),
            });
        }

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }

    async fn read_stream(&self, file_name: &str) -> Result<Vec<u8>, StreamStoreError> {
        if !Self::is_plain_file_name(file_name) {
            tracing::warn!("Rejected stream file name '{}'", file_name);
            return Err(StreamStoreError::NotFound(file_name.to_string()));
        }

        match tokio::fs::read(self.data_dir.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StreamStoreError::NotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("101.ecg"), "512\n600\n").unwrap();
        std::fs::write(dir.path().join("100.ecg"), "500\n520\n600\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a stream").unwrap();
        std::fs::create_dir(dir.path().join("nested.ecg")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_streams_only_ecg_files_sorted() {
        // テスト項目: .ecg ファイルだけがファイル名順で列挙される
        // given (前提条件):
        let dir = create_data_dir();
        let store = FsStreamStore::new(dir.path());

        // when (操作):
        let streams = store.list_streams().await.unwrap();

        // then (期待する結果):
        let names: Vec<&str> = streams.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["100.ecg", "101.ecg"]);
        assert_eq!(streams[0].name, "100");
    }

    #[tokio::test]
    async fn test_list_streams_missing_directory_is_empty() {
        // テスト項目: データディレクトリが存在しない場合は空の一覧になる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let store = FsStreamStore::new(dir.path().join("missing"));

        // when (操作):
        let streams = store.list_streams().await.unwrap();

        // then (期待する結果):
        assert!(streams.is_empty());
    }

    #[tokio::test]
    async fn test_read_stream_returns_bytes() {
        // テスト項目: 存在するストリームファイルの内容を読み出せる
        // given (前提条件):
        let dir = create_data_dir();
        let store = FsStreamStore::new(dir.path());

        // when (操作):
        let bytes = store.read_stream("100.ecg").await.unwrap();

        // then (期待する結果):
        assert_eq!(bytes, b"500\n520\n600\n");
    }

    #[tokio::test]
    async fn test_read_stream_not_found() {
        // テスト項目: 存在しないファイルは NotFound になる
        // given (前提条件):
        let dir = create_data_dir();
        let store = FsStreamStore::new(dir.path());

        // when (操作):
        let result = store.read_stream("999.ecg").await;

        // then (期待する結果):
        assert!(matches!(result, Err(StreamStoreError::NotFound(name)) if name == "999.ecg"));
    }

    #[tokio::test]
    async fn test_read_stream_rejects_path_traversal() {
        // テスト項目: ディレクトリ外を指すファイル名は NotFound として拒否される
        // given (前提条件):
        let dir = create_data_dir();
        let store = FsStreamStore::new(dir.path().join("sub"));

        // when (操作):
        let parent = store.read_stream("..").await;
        let escaped = store.read_stream("../100.ecg").await;

        // then (期待する結果):
        assert!(matches!(parent, Err(StreamStoreError::NotFound(_))));
        assert!(matches!(escaped, Err(StreamStoreError::NotFound(_))));
    }
}
