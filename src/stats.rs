//! Per-topic sent/received counters with JSON persistence
//!
//! Shared between the message-receive path and the broadcast workers, so
//! all mutation goes through one mutex. Load and save failures are logged
//! and contained here; a missing or malformed stats file just means
//! starting from zero.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

pub const STATS_FILE: &str = "channel_stats.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounters {
    pub received: u64,
    pub sent: u64,
}

/// Point-in-time sums over all topics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsTotals {
    pub received: u64,
    pub sent: u64,
    pub topics: usize,
}

pub struct ChannelStatsStore {
    path: PathBuf,
    channels: Mutex<HashMap<String, ChannelCounters>>,
}

impl ChannelStatsStore {
    /// Empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Loads persisted counters; any failure falls back to an empty store.
    /// Real load failures are warned about; a file that simply does not
    /// exist yet (first launch) only gets a debug line.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let channels = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "malformed stats file, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stats file yet");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), "reading stats file failed, starting empty: {e}");
                HashMap::new()
            }
        };
        Self {
            path,
            channels: Mutex::new(channels),
        }
    }

    pub fn record_received(&self, topic: &str) {
        self.lock().entry(topic.to_string()).or_default().received += 1;
    }

    pub fn record_sent(&self, topic: &str) {
        self.lock().entry(topic.to_string()).or_default().sent += 1;
    }

    pub fn totals(&self) -> StatsTotals {
        let channels = self.lock();
        let mut totals = StatsTotals {
            topics: channels.len(),
            ..Default::default()
        };
        for counters in channels.values() {
            totals.received += counters.received;
            totals.sent += counters.sent;
        }
        totals
    }

    pub fn snapshot(&self) -> HashMap<String, ChannelCounters> {
        self.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the whole mapping; failure is logged, never raised
    pub fn save(&self) {
        let snapshot = self.snapshot();
        let raw = match serde_json::to_string_pretty(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                error!("serializing channel stats failed: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, raw) {
            error!(path = %self.path.display(), "writing channel stats failed: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChannelCounters>> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counters_start_at_zero() {
        let store = ChannelStatsStore::new("unused.json");
        assert_eq!(store.totals(), StatsTotals::default());
    }

    #[test]
    fn increments_create_topics_on_first_use() {
        let store = ChannelStatsStore::new("unused.json");
        store.record_received("a");
        store.record_sent("a");
        store.record_sent("b");
        let totals = store.totals();
        assert_eq!(totals.received, 1);
        assert_eq!(totals.sent, 2);
        assert_eq!(totals.topics, 2);
    }

    #[test]
    fn concurrent_increments_are_lossless() {
        let store = Arc::new(ChannelStatsStore::new("unused.json"));
        let threads: u64 = 8;
        let per_thread: u64 = 1000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..per_thread {
                        store.record_received("load/topic");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.totals().received, threads * per_thread);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATS_FILE);

        let store = ChannelStatsStore::new(&path);
        store.record_received("test/x");
        store.record_received("test/x");
        store.record_sent("test/y");
        store.save();

        let reloaded = ChannelStatsStore::load(&path);
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChannelStatsStore::load(dir.path().join(STATS_FILE));
        assert_eq!(store.totals(), StatsTotals::default());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATS_FILE);
        fs::write(&path, "{not json").unwrap();

        let store = ChannelStatsStore::load(&path);
        assert_eq!(store.totals(), StatsTotals::default());
    }
}
