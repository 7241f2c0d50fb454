//! Wiring shared by every command that talks to the backing store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use dothi_core::{AppConfig, Clock, Environment, SystemClock, ViewEngine, WeekNavigator};
use dothi_store::{
    FileStorage, FirestoreClient, KeyValueStorage, LinkService, MemoryStorage, SharedLinks,
    SnapshotStore, SweepHandle,
};

pub(crate) struct AppContext {
    pub clock: Arc<dyn Clock>,
    pub links: LinkService,
    pub engine: ViewEngine,
    /// Where the snapshot lives on disk; `None` in the test environment.
    pub snapshot_dir: Option<PathBuf>,
    _sweeper: SweepHandle,
}

/// Snapshot backing for `config.env`. The test environment keeps it in
/// memory so runs leave nothing behind.
pub(crate) fn snapshot_storage(config: &AppConfig) -> (Arc<dyn KeyValueStorage>, Option<PathBuf>) {
    match config.env {
        Environment::Test => (Arc::new(MemoryStorage::new()), None),
        Environment::Development | Environment::Production => {
            let storage = FileStorage::new(&config.cache_dir);
            let dir = storage.dir().to_path_buf();
            (Arc::new(storage), Some(dir))
        }
    }
}

impl AppContext {
    /// Builds the link service over Firestore with the snapshot store and
    /// warms the cache from it.
    pub fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let window = Duration::from_secs(config.cache_window_secs);

        let store = FirestoreClient::from_config(config).context("build Firestore client")?;
        let (storage, snapshot_dir) = snapshot_storage(config);
        let snapshot = SnapshotStore::with_window(storage, Arc::clone(&clock), window);
        let links = LinkService::with_window(Arc::new(store), Arc::clone(&clock), window)
            .with_snapshot(snapshot);
        links.warm_from_snapshot();

        let sweeper = links.start_sweeper(Duration::from_secs(config.cache_sweep_interval_secs));
        let engine = ViewEngine::new(config.member_match);

        Ok(Self {
            clock,
            links,
            engine,
            snapshot_dir,
            _sweeper: sweeper,
        })
    }

    /// Navigator positioned `offset` weeks from the current week, never past
    /// it.
    pub fn navigator(&self, offset: i64) -> WeekNavigator {
        let mut navigator = WeekNavigator::new(Arc::clone(&self.clock));
        navigator.jump(offset);
        navigator
    }

    pub async fn all_links(&self, refresh: bool) -> anyhow::Result<SharedLinks> {
        self.links
            .fetch_all(refresh)
            .await
            .context("failed to fetch links; retry with --refresh")
    }
}
