//! Seams between the playback controller and its collaborators: the
//! adaptive streaming engine, the media sink, and the stream proxy.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Bounded buffer and retry limits handed to a new engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_buffer_length_secs: u32,
    pub max_buffer_size_bytes: u64,
    pub manifest_load_max_retry: u32,
    pub level_load_max_retry: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        crate::config::PlaybackConfig::default().engine_settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Network,
    Media,
    Other,
}

/// Error reported by the streaming engine. Non-fatal errors are absorbed
/// by the controller through the engine's recovery calls; fatal errors end
/// the session.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} stream error: {detail}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub fatal: bool,
    pub detail: String,
}

impl EngineError {
    pub fn fatal(kind: EngineErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            detail: detail.into(),
        }
    }

    pub fn recoverable(kind: EngineErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            detail: detail.into(),
        }
    }
}

/// Events emitted by a live engine instance.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The stream manifest was fetched and parsed; playback may start.
    ManifestParsed,
    /// New media data was appended to the buffer.
    FragmentBuffered,
    /// Playback ran out of buffered data.
    BufferStalled,
    Error(EngineError),
}

/// One adaptive-streaming engine instance, already bound to a source URL
/// and attached to the media sink. The controller owns at most one live
/// handle and destroys it before creating the next.
pub trait StreamEngine: Send {
    /// Restart loading from the live edge (also the network-error recovery).
    fn start_load(&mut self);
    fn stop_load(&mut self);
    /// Engine-internal media decoding recovery.
    fn recover_media_error(&mut self);
    /// Release all engine resources. After this the instance must emit no
    /// further events.
    fn destroy(&mut self);
}

/// Builds engine instances. Returns the handle together with the receiver
/// for its event stream.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        source_url: &str,
        settings: &EngineSettings,
    ) -> Result<(Box<dyn StreamEngine>, mpsc::Receiver<EngineEvent>), EngineError>;
}

#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink's autoplay policy rejected playback. Expected and
    /// non-fatal: the session stays attached and waits for a user gesture.
    #[error("autoplay rejected by media sink policy")]
    AutoplayBlocked,
    #[error("media sink rejected playback: {0}")]
    Rejected(String),
}

/// The video element the engine renders into.
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn play(&self) -> Result<(), SinkError>;
    fn pause(&self);
    fn detach(&self);
}

/// Address book and cleanup channel for the stream proxy.
#[async_trait]
pub trait StreamGateway: Send + Sync {
    /// Manifest URL for a channel's proxied stream.
    fn stream_url(&self, channel_number: u32) -> String;

    /// Best-effort notification releasing server-side resources for the
    /// channel. Never fails the caller; implementations log and swallow.
    async fn notify_cleanup(&self, channel_number: u32);
}

/// HTTP implementation of [`StreamGateway`] against the stream proxy.
pub struct HttpStreamGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStreamGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl StreamGateway for HttpStreamGateway {
    fn stream_url(&self, channel_number: u32) -> String {
        format!("{}/stream/{}", self.base_url, channel_number)
    }

    async fn notify_cleanup(&self, channel_number: u32) {
        let url = format!("{}/stream/{}/cleanup", self.base_url, channel_number);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Stream cleanup acknowledged for channel {}", channel_number);
            }
            Ok(response) => {
                warn!(
                    "Stream cleanup for channel {} returned {}",
                    channel_number,
                    response.status()
                );
            }
            Err(err) => {
                warn!("Stream cleanup for channel {} failed: {}", channel_number, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_builds_stream_urls() {
        let gateway =
            HttpStreamGateway::new(reqwest::Client::new(), "http://localhost:8000/");
        assert_eq!(gateway.stream_url(42), "http://localhost:8000/stream/42");
    }

    #[test]
    fn default_settings_match_playback_config() {
        let settings = EngineSettings::default();
        assert_eq!(settings.max_buffer_length_secs, 30);
        assert_eq!(settings.manifest_load_max_retry, 4);
        assert_eq!(settings.level_load_max_retry, 4);
    }
}
