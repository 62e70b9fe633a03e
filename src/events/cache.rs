//! TTL cache for scraped event lists.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::events::config::CacheConfig;
use crate::events::sources::EventSourceKind;
use crate::events::types::EventRecord;

#[derive(Clone)]
struct CacheEntry {
    events: Vec<EventRecord>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(events: Vec<EventRecord>, ttl: Duration) -> Self {
        Self {
            events,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache of the last scrape per source.
pub struct EventCache {
    config: CacheConfig,
    entries: DashMap<EventSourceKind, CacheEntry>,
}

impl EventCache {
    /// Create a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Cached events for `source`, unless missing or expired.
    #[must_use]
    pub fn get(&self, source: EventSourceKind) -> Option<Vec<EventRecord>> {
        if !self.config.enabled {
            return None;
        }

        self.entries.get(&source).and_then(|entry| {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(&source);
                None
            } else {
                Some(entry.events.clone())
            }
        })
    }

    /// Store the events scraped from `source`.
    pub fn set(&self, source: EventSourceKind, events: &[EventRecord]) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        self.enforce_max_entries(source);

        let ttl = Duration::from_secs(self.config.ttl_seconds);
        self.entries
            .insert(source, CacheEntry::new(events.to_vec(), ttl));
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live or expired entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Make room for `incoming`, evicting the entry closest to expiry.
    fn enforce_max_entries(&self, incoming: EventSourceKind) {
        if self.entries.contains_key(&incoming) || self.entries.len() < self.config.max_entries {
            return;
        }

        self.cleanup_expired();

        while self.entries.len() >= self.config.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.expires_at)
                .map(|entry| *entry.key());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
