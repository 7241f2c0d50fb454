//! Remote fetching, caching and local persistence for the link aggregator.

pub mod cache;
pub mod error;
pub mod firestore;
mod retry;
pub mod service;
pub mod snapshot;
pub mod source;
pub mod storage;
pub mod sweep;
pub mod visitors;

pub use cache::{CacheEntry, Sweep, TimeBoxedCache, DEFAULT_CACHE_WINDOW};
pub use error::{StorageError, StoreError};
pub use firestore::FirestoreClient;
pub use service::{range_key, LinkService, Page, SharedLinks, FULL_LIST_KEY};
pub use snapshot::{Snapshot, SnapshotStore, SNAPSHOT_KEY, SNAPSHOT_TIMESTAMP_KEY};
pub use source::{LinkQuery, LinkStore, PageCursor, RawLink};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use sweep::{spawn_sweeper, SweepHandle, DEFAULT_SWEEP_INTERVAL};
pub use visitors::{
    RealtimeDbClient, Subscription, VisitorCounter, VisitorStats, VisitorTracker,
    DEFAULT_STATS_WINDOW,
};
