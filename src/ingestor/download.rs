//! Chunked playlist download with byte-level progress reporting.
//!
//! A pure data/progress producer: it never touches caller state beyond
//! invoking the supplied callback after every chunk.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::errors::IngestError;

/// Progress callback invoked as `(bytes_received, total_bytes)`.
///
/// `total_bytes` comes from the `Content-Length` header and is `0` when the
/// server did not send one; callers must treat `0` as "unknown total".
pub type ProgressFn = dyn Fn(u64, u64) + Send + Sync;

/// Download `url` in chunks, invoking `on_progress` after every chunk, and
/// return the accumulated body.
pub async fn fetch_with_progress(
    client: &reqwest::Client,
    url: &str,
    on_progress: Option<&ProgressFn>,
) -> Result<Vec<u8>, IngestError> {
    debug!("Starting playlist download from {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let stream = response.bytes_stream().map(|chunk| chunk.map_err(IngestError::Read));
    collect_with_progress(stream, total, on_progress).await
}

/// Accumulate a chunk stream into one buffer, reporting progress per chunk.
///
/// Factored out of [`fetch_with_progress`] so the progress contract is
/// testable without a socket.
pub(crate) async fn collect_with_progress<S>(
    stream: S,
    total: u64,
    on_progress: Option<&ProgressFn>,
) -> Result<Vec<u8>, IngestError>
where
    S: Stream<Item = Result<Bytes, IngestError>>,
{
    futures::pin_mut!(stream);
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.extend_from_slice(&chunk);
        if let Some(on_progress) = on_progress {
            on_progress(buffer.len() as u64, total);
        }
    }

    debug!("Download completed: {} bytes", buffer.len());
    Ok(buffer)
}
