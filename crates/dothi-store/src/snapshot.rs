//! Persisted copy of the last successful full fetch.
//!
//! Two keys, matching what the web client kept in `localStorage`: the JSON
//! list under [`SNAPSHOT_KEY`] and its write time (epoch millis, decimal)
//! under [`SNAPSHOT_TIMESTAMP_KEY`]. Every failure here is logged and treated
//! as a miss; persistence is never allowed to fail a fetch.

use std::sync::Arc;
use std::time::Duration;

use dothi_core::{Clock, LinkRecord};

use crate::cache::DEFAULT_CACHE_WINDOW;
use crate::error::StorageError;
use crate::storage::KeyValueStorage;

pub const SNAPSHOT_KEY: &str = "video_data_cache";
pub const SNAPSHOT_TIMESTAMP_KEY: &str = "video_data_cache_timestamp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<LinkRecord>,
    pub fetched_at: i64,
}

pub struct SnapshotStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl SnapshotStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(storage, clock, DEFAULT_CACHE_WINDOW)
    }

    pub fn with_window(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            window,
        }
    }

    /// The persisted snapshot if it exists and is still within the window.
    #[must_use]
    pub fn load(&self) -> Option<Snapshot> {
        let snapshot = match self.read() {
            Ok(snapshot) => snapshot?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load persisted link snapshot");
                return None;
            }
        };

        let age = self.clock.now_millis().saturating_sub(snapshot.fetched_at);
        let window = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        if age >= window {
            tracing::debug!(age_ms = age, "persisted link snapshot is stale");
            return None;
        }
        Some(snapshot)
    }

    /// Persists `records` stamped with the current time.
    pub fn save(&self, records: &[LinkRecord]) {
        if let Err(err) = self.write(records) {
            tracing::warn!(error = %err, "failed to persist link snapshot");
        }
    }

    pub fn clear(&self) {
        for key in [SNAPSHOT_KEY, SNAPSHOT_TIMESTAMP_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                tracing::warn!(key, error = %err, "failed to clear persisted snapshot key");
            }
        }
    }

    fn read(&self) -> Result<Option<Snapshot>, StorageError> {
        let Some(body) = self.storage.get_item(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        let Some(stamp) = self.storage.get_item(SNAPSHOT_TIMESTAMP_KEY)? else {
            return Ok(None);
        };
        let Ok(fetched_at) = stamp.trim().parse::<i64>() else {
            tracing::warn!(stamp = %stamp, "ignoring persisted snapshot with unreadable timestamp");
            return Ok(None);
        };

        let mut records: Vec<LinkRecord> =
            serde_json::from_str(&body).map_err(|source| StorageError::Serialize {
                key: SNAPSHOT_KEY.to_string(),
                source,
            })?;
        for record in &mut records {
            record.redecorate();
        }

        Ok(Some(Snapshot {
            records,
            fetched_at,
        }))
    }

    fn write(&self, records: &[LinkRecord]) -> Result<(), StorageError> {
        let body = serde_json::to_string(records).map_err(|source| StorageError::Serialize {
            key: SNAPSHOT_KEY.to_string(),
            source,
        })?;
        let fetched_at = self.clock.now_millis();
        self.storage.set_item(SNAPSHOT_KEY, &body)?;
        self.storage
            .set_item(SNAPSHOT_TIMESTAMP_KEY, &fetched_at.to_string())?;
        Ok(())
    }
}
