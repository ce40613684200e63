//! Line-oriented M3U playlist parser.
//!
//! Lenient by design: malformed blocks are dropped silently and parsing
//! always continues. Only the ingestion orchestrator decides whether an
//! overall result is acceptable.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{Channel, DEFAULT_GROUP};

const DIRECTIVE_PREFIX: &str = "#EXTINF:";
const URL_PREFIX: &str = "http";

static ATTR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z-]+)="([^"]*)""#).expect("valid attribute pattern"));

/// The channel block currently under construction. Owned exclusively by
/// the parser and never exposed outside this module.
struct PendingChannel {
    channel_number: u32,
    guide_id: String,
    name: String,
    group: String,
    logo: Option<String>,
}

impl PendingChannel {
    fn into_channel(self, url: String) -> Channel {
        Channel {
            channel_number: self.channel_number,
            guide_id: self.guide_id,
            name: self.name,
            url,
            group: self.group,
            logo: self.logo,
            is_favorite: false,
            last_watched: None,
        }
    }
}

/// Tagged accumulator state: either no block is open, or one directive has
/// been seen and we are waiting for its URL line.
enum BlockState {
    Idle,
    Open(PendingChannel),
}

/// Parse a decoded playlist document into channels, in order of appearance.
///
/// A channel is emitted only once both a non-empty name and a URL line have
/// been observed; a directive block missing its URL line contributes
/// nothing. Blank lines and unrecognized content are ignored.
pub fn parse_playlist(text: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut state = BlockState::Idle;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();

        if let Some(directive) = line.strip_prefix(DIRECTIVE_PREFIX) {
            // A new directive discards any block still waiting for its URL.
            state = BlockState::Open(open_block(directive, index));
        } else if line.starts_with(URL_PREFIX) {
            match std::mem::replace(&mut state, BlockState::Idle) {
                BlockState::Open(pending) if !pending.name.is_empty() => {
                    channels.push(pending.into_channel(line.to_string()));
                }
                // URL line with no valid open block: skipped, not an error.
                _ => {}
            }
        }
    }

    debug!("Parsed {} channels from playlist", channels.len());
    channels
}

/// Open a new block from the text after the `#EXTINF:` prefix. `index` is
/// the 0-based document line index of the directive, which supplies the
/// positional fallbacks for channel number and guide id.
fn open_block(directive: &str, index: usize) -> PendingChannel {
    // The display name is everything after the last comma; the attribute
    // list lives before it.
    let (attrs_part, name) = match directive.rsplit_once(',') {
        Some((attrs, name)) => (attrs, name.trim().to_string()),
        None => (directive, String::new()),
    };

    let mut pending = PendingChannel {
        channel_number: (index + 1) as u32,
        guide_id: format!("channel-{index}"),
        name,
        group: DEFAULT_GROUP.to_string(),
        logo: None,
    };

    // Sequential assignment: the last occurrence of a repeated attribute wins.
    for caps in ATTR_PATTERN.captures_iter(attrs_part) {
        let value = caps[2].to_string();
        match &caps[1] {
            "tvg-logo" => pending.logo = Some(value),
            "group-title" => pending.group = value,
            "tvg-id" => pending.guide_id = value,
            "tvg-name" => {
                if !value.is_empty() {
                    pending.name = value;
                }
            }
            _ => {}
        }
    }

    pending
}
