//! Playlist ingestion pipeline: chunked download with progress, lenient
//! M3U parsing, and bulk handoff to the catalog service.
//!
//! Stages run strictly in sequence within one ingestion call: the download
//! completes fully before parsing begins, and parsing completes before the
//! save is issued. No retries happen at this layer; a caller-facing
//! refresh flow may re-invoke the whole pipeline instead.

pub mod download;
pub mod parser;

use async_trait::async_trait;
use tracing::info;

pub use download::{ProgressFn, fetch_with_progress};
pub use parser::parse_playlist;

use crate::errors::{CatalogError, IngestError};
use crate::models::Channel;

/// Catalog collaborator contract used by the orchestrator. The save is
/// treated as all-or-nothing: on failure the orchestrator assumes nothing
/// was persisted.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn save_channels(&self, channels: &[Channel]) -> Result<(), CatalogError>;
}

/// Orchestrates one playlist ingestion: download, decode, parse, save.
pub struct PlaylistIngestor<S> {
    client: reqwest::Client,
    store: S,
}

impl<S: CatalogStore> PlaylistIngestor<S> {
    pub fn new(client: reqwest::Client, store: S) -> Self {
        Self { client, store }
    }

    /// Run the full pipeline for `url`, relaying download progress to
    /// `on_progress`. Returns the parsed channels after a successful save.
    pub async fn ingest(
        &self,
        url: &str,
        on_progress: Option<&ProgressFn>,
    ) -> Result<Vec<Channel>, IngestError> {
        info!("Starting playlist ingestion from {}", url);
        let raw = fetch_with_progress(&self.client, url, on_progress).await?;
        self.ingest_document(raw).await
    }

    /// Decode, parse, and persist an already-downloaded document.
    async fn ingest_document(&self, raw: Vec<u8>) -> Result<Vec<Channel>, IngestError> {
        let text = String::from_utf8(raw)?;
        let channels = parse_playlist(&text);
        info!("Parsed {} channels, saving to catalog", channels.len());

        self.store
            .save_channels(&channels)
            .await
            .map_err(IngestError::Save)?;

        info!("Ingestion completed: {} channels saved", channels.len());
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingStore {
        saved: Mutex<Vec<Vec<Channel>>>,
        fail: bool,
    }

    impl RecordingStore {
        fn new(fail: bool) -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl CatalogStore for RecordingStore {
        async fn save_channels(&self, channels: &[Channel]) -> Result<(), CatalogError> {
            if self.fail {
                return Err(CatalogError::Http {
                    status: 500,
                    body: "database unavailable".to_string(),
                });
            }
            self.saved.lock().unwrap().push(channels.to_vec());
            Ok(())
        }
    }

    fn ingestor(fail: bool) -> PlaylistIngestor<RecordingStore> {
        PlaylistIngestor::new(reqwest::Client::new(), RecordingStore::new(fail))
    }

    #[tokio::test]
    async fn document_is_parsed_and_saved_once() {
        let ingestor = ingestor(false);
        let doc = b"#EXTINF:-1,CNN\nhttp://example.com/cnn.m3u8\n".to_vec();

        let channels = ingestor.ingest_document(doc).await.unwrap();
        assert_eq!(channels.len(), 1);

        let saved = ingestor.store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0], channels);
    }

    #[tokio::test]
    async fn invalid_utf8_fails_before_saving() {
        let ingestor = ingestor(false);
        let result = ingestor.ingest_document(vec![0xff, 0xfe, 0xfd]).await;
        assert!(matches!(result, Err(IngestError::Decode(_))));
        assert!(ingestor.store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_failure_is_wrapped() {
        let ingestor = ingestor(true);
        let doc = b"#EXTINF:-1,CNN\nhttp://example.com/cnn.m3u8\n".to_vec();
        let result = ingestor.ingest_document(doc).await;
        assert!(matches!(result, Err(IngestError::Save(_))));
    }
}
