//! Recent-channel history: a bounded, most-recent-first list keyed by
//! channel number, with entries expiring after a maximum age.

use chrono::{DateTime, Duration, Utc};

use crate::models::Channel;

const DEFAULT_CAPACITY: usize = 10;
const DEFAULT_MAX_AGE_HOURS: i64 = 24;

struct RecentEntry {
    channel: Channel,
    recorded_at: DateTime<Utc>,
}

pub struct RecentChannels {
    entries: Vec<RecentEntry>,
    capacity: usize,
    max_age: Duration,
}

impl Default for RecentChannels {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::hours(DEFAULT_MAX_AGE_HOURS))
    }
}

impl RecentChannels {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            max_age,
        }
    }

    /// Record a channel selection, stamping `last_watched` on the stored
    /// copy. An existing entry for the same channel number moves to the
    /// front; the list is truncated to capacity.
    pub fn record(&mut self, channel: &Channel) {
        self.record_at(channel, Utc::now());
    }

    fn record_at(&mut self, channel: &Channel, now: DateTime<Utc>) {
        let max_age = self.max_age;
        self.entries.retain(|entry| {
            now - entry.recorded_at <= max_age
                && entry.channel.channel_number != channel.channel_number
        });

        let mut stored = channel.clone();
        stored.last_watched = Some(now);
        self.entries.insert(
            0,
            RecentEntry {
                channel: stored,
                recorded_at: now,
            },
        );
        self.entries.truncate(self.capacity);
    }

    /// Most-recent-first snapshot, with expired entries filtered out.
    pub fn list(&self) -> Vec<Channel> {
        self.list_at(Utc::now())
    }

    fn list_at(&self, now: DateTime<Utc>) -> Vec<Channel> {
        self.entries
            .iter()
            .filter(|entry| now - entry.recorded_at <= self.max_age)
            .map(|entry| entry.channel.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(n: u32) -> Channel {
        Channel {
            channel_number: n,
            guide_id: format!("channel-{n}"),
            name: format!("Channel {n}"),
            url: format!("http://example.com/{n}.m3u8"),
            group: "Default".to_string(),
            logo: None,
            is_favorite: false,
            last_watched: None,
        }
    }

    #[test]
    fn reselection_moves_channel_to_front_without_duplicates() {
        let mut recents = RecentChannels::default();
        let now = Utc::now();
        recents.record_at(&channel(1), now);
        recents.record_at(&channel(2), now + Duration::seconds(1));
        recents.record_at(&channel(1), now + Duration::seconds(2));

        let numbers: Vec<u32> = recents
            .list_at(now + Duration::seconds(2))
            .iter()
            .map(|c| c.channel_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn list_is_bounded_by_capacity() {
        let mut recents = RecentChannels::new(3, Duration::hours(24));
        let now = Utc::now();
        for n in 1..=5 {
            recents.record_at(&channel(n), now + Duration::seconds(n as i64));
        }
        let numbers: Vec<u32> = recents
            .list_at(now + Duration::seconds(5))
            .iter()
            .map(|c| c.channel_number)
            .collect();
        assert_eq!(numbers, vec![5, 4, 3]);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let mut recents = RecentChannels::new(10, Duration::hours(24));
        let now = Utc::now();
        recents.record_at(&channel(1), now);
        recents.record_at(&channel(2), now + Duration::hours(12));

        let later = now + Duration::hours(25);
        let numbers: Vec<u32> = recents
            .list_at(later)
            .iter()
            .map(|c| c.channel_number)
            .collect();
        assert_eq!(numbers, vec![2]);
    }

    #[test]
    fn recorded_channel_gets_last_watched_stamp() {
        let mut recents = RecentChannels::default();
        let now = Utc::now();
        recents.record_at(&channel(9), now);
        let listed = recents.list_at(now);
        assert_eq!(listed[0].last_watched, Some(now));
    }
}
