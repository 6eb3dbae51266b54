//! Sample sources: where a viewer's recorded streams come from.

use std::path::PathBuf;

use async_trait::async_trait;
use ecg_live_server::{
    domain::{Sample, StreamStore, StreamStoreError},
    infrastructure::{dto::http::StreamListDto, stream_store::FsStreamStore},
};

use crate::error::ClientError;

/// Produces the list of streams and the samples of one stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Stream file names in display order.
    async fn list_streams(&self) -> Result<Vec<String>, ClientError>;

    /// Load every sample of the stream, failing with `StreamNotFound` if it does not exist.
    async fn load_stream(&self, stream_id: &str) -> Result<Vec<Sample>, ClientError>;
}

/// Parse a stream file: one integer per line.
///
/// Lines that are blank, not an integer, or outside the 10-bit range are skipped.
pub fn parse_samples(text: &str) -> Vec<Sample> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<i64>() {
            Ok(value) => match Sample::new(value) {
                Ok(sample) => Some(sample),
                Err(e) => {
                    tracing::debug!("Skipping sample line '{}': {}", line, e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("Skipping sample line '{}': {}", line, e);
                None
            }
        })
        .collect()
}

/// Display name of a stream file (`100.ecg` → `100`).
pub fn stream_display_name(file_name: &str) -> &str {
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Reads streams from a relay server over HTTP.
pub struct HttpSampleSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSampleSource {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one stream file, with the file name percent-encoded as a path segment.
    pub fn stream_url(&self, stream_id: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("base address '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!(
                    "base address '{}' cannot hold a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["EcgData", stream_id]);
        Ok(url)
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn list_streams(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}api/streams", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Source(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let list: StreamListDto = response
            .json()
            .await
            .map_err(|e| ClientError::Source(e.to_string()))?;
        Ok(list.streams.into_iter().map(|s| s.file_name).collect())
    }

    async fn load_stream(&self, stream_id: &str) -> Result<Vec<Sample>, ClientError> {
        let url = self.stream_url(stream_id)?;
        tracing::info!("Fetching stream from: {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::StreamNotFound(stream_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(ClientError::Source(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Source(e.to_string()))?;
        Ok(parse_samples(&text))
    }
}

/// Reads streams straight from a local data directory.
pub struct FsSampleSource {
    store: FsStreamStore,
}

impl FsSampleSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: FsStreamStore::new(data_dir),
        }
    }
}

#[async_trait]
impl SampleSource for FsSampleSource {
    async fn list_streams(&self) -> Result<Vec<String>, ClientError> {
        let entries = self
            .store
            .list_streams()
            .await
            .map_err(|e| ClientError::Source(e.to_string()))?;
        Ok(entries.into_iter().map(|e| e.file_name).collect())
    }

    async fn load_stream(&self, stream_id: &str) -> Result<Vec<Sample>, ClientError> {
        match self.store.read_stream(stream_id).await {
            Ok(bytes) => Ok(parse_samples(&String::from_utf8_lossy(&bytes))),
            Err(StreamStoreError::NotFound(name)) => Err(ClientError::StreamNotFound(name)),
            Err(e) => Err(ClientError::Source(e.to_string())),
        }
    }
}

/// The list of streams and which one is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSelection {
    streams: Vec<String>,
    current: usize,
}

impl StreamSelection {
    /// Fails with `InvalidStreamIndex` when `index` does not name a stream.
    pub fn new(streams: Vec<String>, index: usize) -> Result<Self, ClientError> {
        let selection = Self {
            streams,
            current: 0,
        };
        selection.resolve(index)?;
        Ok(Self {
            current: index,
            ..selection
        })
    }

    /// File name of the stream at `index`.
    pub fn resolve(&self, index: usize) -> Result<&str, ClientError> {
        self.streams
            .get(index)
            .map(String::as_str)
            .ok_or(ClientError::InvalidStreamIndex {
                index,
                count: self.streams.len(),
            })
    }

    pub fn select(&mut self, index: usize) -> Result<(), ClientError> {
        self.resolve(index)?;
        self.current = index;
        Ok(())
    }

    pub fn streams(&self) -> &[String] {
        &self.streams
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_file(&self) -> &str {
        &self.streams[self.current]
    }

    pub fn current_name(&self) -> &str {
        stream_display_name(self.current_file())
    }

    pub fn next_index(&self) -> Option<usize> {
        (self.current + 1 < self.streams.len()).then_some(self.current + 1)
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.current.checked_sub(1)
    }
}
