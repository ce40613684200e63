//! Core data model shared by the ingestion pipeline, the playback
//! controller, and the catalog service client.
//!
//! Field names follow the catalog API wire format (snake_case JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group label assigned to channels whose playlist entry carries no
/// `group-title` attribute.
pub const DEFAULT_GROUP: &str = "Default";

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// One tunable entry from the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Positive, unique key used for favorite toggling, recent-history
    /// tracking, and stream-endpoint addressing.
    pub channel_number: u32,
    /// Electronic program guide correlation id. Falls back to a synthetic
    /// `channel-{index}` value derived from parse order.
    pub guide_id: String,
    pub name: String,
    /// Upstream media URL.
    pub url: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<DateTime<Utc>>,
}

/// One page of the catalog channel listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPage {
    pub items: Vec<Channel>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// Group summary as returned by `GET /channels/groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub name: String,
    pub count: u64,
}

/// Filter parameters for the paginated channel listing.
#[derive(Debug, Clone, Default)]
pub struct ChannelQuery {
    pub skip: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub group: Option<String>,
    pub favorites_only: bool,
}

impl ChannelQuery {
    pub fn page(page: u64, page_size: u64) -> Self {
        Self {
            skip: page * page_size,
            limit: page_size,
            ..Self::default()
        }
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Render the query as URL parameter pairs. `favorites_only` is only
    /// emitted when set, matching what the catalog API expects.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(group) = &self.group {
            pairs.push(("group", group.clone()));
        }
        if self.favorites_only {
            pairs.push(("favorites_only", "true".to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_include_only_set_filters() {
        let query = ChannelQuery::page(2, 50);
        assert_eq!(
            query.to_query_pairs(),
            vec![("skip", "100".to_string()), ("limit", "50".to_string())]
        );

        let query = ChannelQuery::page(0, 100)
            .search("news")
            .group("Sports")
            .favorites_only(true);
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("search", "news".to_string())));
        assert!(pairs.contains(&("group", "Sports".to_string())));
        assert!(pairs.contains(&("favorites_only", "true".to_string())));
    }

    #[test]
    fn channel_deserializes_with_defaults() {
        let json = r#"{
            "channel_number": 7,
            "guide_id": "channel-6",
            "name": "CNN",
            "url": "http://example.com/cnn.m3u8"
        }"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.group, DEFAULT_GROUP);
        assert!(!channel.is_favorite);
        assert!(channel.logo.is_none());
        assert!(channel.last_watched.is_none());
    }
}
