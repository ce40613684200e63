//! HTTP client for the catalog service (pagination, search, groups,
//! favorites, bulk persistence, server-side playlist refresh).
//!
//! The catalog itself is an external collaborator; this module only
//! implements its request/response contract.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

use crate::errors::CatalogError;
use crate::ingestor::{CatalogStore, ProgressFn};
use crate::models::{Channel, ChannelGroup, ChannelPage, ChannelQuery};

pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CatalogError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /channels` with pagination and filter parameters.
    pub async fn get_channels(&self, query: &ChannelQuery) -> Result<ChannelPage, CatalogError> {
        let response = self
            .client
            .get(format!("{}/channels", self.base_url))
            .query(&query.to_query_pairs())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /channels/groups`.
    pub async fn get_groups(&self) -> Result<Vec<ChannelGroup>, CatalogError> {
        let response = self
            .client
            .get(format!("{}/channels/groups", self.base_url))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `PUT /channels/{channel_number}/favorite`; returns the updated
    /// channel with `is_favorite` and `last_watched` refreshed.
    pub async fn toggle_favorite(&self, channel_number: u32) -> Result<Channel, CatalogError> {
        let response = self
            .client
            .put(format!(
                "{}/channels/{}/favorite",
                self.base_url, channel_number
            ))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /channels/bulk` persisting the full ingested set.
    pub async fn save_channels_bulk(&self, channels: &[Channel]) -> Result<(), CatalogError> {
        info!("Saving {} channels to catalog", channels.len());
        let response = self
            .client
            .post(format!("{}/channels/bulk", self.base_url))
            .json(channels)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Bulk save succeeded");
        Ok(())
    }

    /// `POST /m3u/refresh?url=<encoded>`, streaming the response body so
    /// the server-side refresh reports progress like a local download.
    pub async fn refresh_playlist(
        &self,
        playlist_url: &str,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CatalogError> {
        let url = format!(
            "{}/m3u/refresh?url={}",
            self.base_url,
            urlencoding::encode(playlist_url)
        );
        info!("Requesting server-side playlist refresh");
        let response = self.client.post(url).send().await?;
        let response = Self::check(response).await?;

        let total = response.content_length().unwrap_or(0);
        let mut received = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            if let Some(on_progress) = on_progress {
                on_progress(received, total);
            }
        }
        info!("Playlist refresh completed");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for CatalogClient {
    async fn save_channels(&self, channels: &[Channel]) -> Result<(), CatalogError> {
        self.save_channels_bulk(channels).await
    }
}

/// Favorite-toggle seam so view-side caches can be tested without HTTP.
#[async_trait]
pub trait FavoriteToggler: Send + Sync {
    async fn toggle_favorite(&self, channel_number: u32) -> Result<Channel, CatalogError>;
}

#[async_trait]
impl FavoriteToggler for CatalogClient {
    async fn toggle_favorite(&self, channel_number: u32) -> Result<Channel, CatalogError> {
        CatalogClient::toggle_favorite(self, channel_number).await
    }
}

/// Client-side cache of one loaded channel page, with optimistic favorite
/// toggling: the flag flips immediately, and is reverted if the catalog
/// call fails.
pub struct ChannelList {
    channels: Vec<Channel>,
}

impl ChannelList {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn find(&self, channel_number: u32) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.channel_number == channel_number)
    }

    /// Optimistically toggle `is_favorite` for a channel, reverting the
    /// local flip when the catalog rejects the update.
    pub async fn toggle_favorite<T: FavoriteToggler>(
        &mut self,
        catalog: &T,
        channel_number: u32,
    ) -> Result<&Channel, CatalogError> {
        let index = self
            .channels
            .iter()
            .position(|c| c.channel_number == channel_number)
            .ok_or(CatalogError::Http {
                status: 404,
                body: format!("channel {channel_number} not in the loaded page"),
            })?;

        self.channels[index].is_favorite = !self.channels[index].is_favorite;

        match catalog.toggle_favorite(channel_number).await {
            Ok(updated) => {
                self.channels[index] = updated;
                Ok(&self.channels[index])
            }
            Err(err) => {
                self.channels[index].is_favorite = !self.channels[index].is_favorite;
                Err(err)
            }
        }
    }
}
