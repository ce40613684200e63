//! Error type definitions for the tuner core.
//!
//! Each layer owns its error enum; `TunerError` rolls them up for callers
//! that drive whole flows (the CLI, a UI shell). Recoverable playback
//! conditions never appear here: they are absorbed inside the playback
//! controller and only surface through `PlaybackStatus::Fatal`.

use thiserror::Error;

/// Top-level error for caller-facing flows.
#[derive(Error, Debug)]
pub enum TunerError {
    /// Playlist ingestion failures (download, decode, or save).
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Catalog service call failures.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl TunerError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Failures in the download/parse/save ingestion sequence.
///
/// Malformed playlist blocks are not represented here: the parser skips
/// them silently and the pipeline continues.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Non-success HTTP status on the initial fetch.
    #[error("HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// Response body became unreadable mid-transfer.
    #[error("Failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    /// Downloaded document is not valid UTF-8.
    #[error("Failed to decode playlist as UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Bulk save to the catalog failed. No partial persistence is assumed.
    #[error("Failed to save channels: {0}")]
    Save(#[source] CatalogError),

    /// Request could not be sent at all.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Catalog service client errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Non-success HTTP status, with whatever body the service returned.
    #[error("Catalog returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport-level failure (connect, read, deserialize).
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
