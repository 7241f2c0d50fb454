//! Cache-backed link fetching.
//!
//! [`LinkService`] sits between callers and a [`LinkStore`]. The full list is
//! cached under one fixed key and mirrored to the local snapshot; date-range
//! queries get their own keys. When the store fails, the full list degrades
//! to whatever was cached last, however old.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dothi_core::{Clock, LinkRecord};

use crate::cache::{Sweep, TimeBoxedCache, DEFAULT_CACHE_WINDOW};
use crate::error::StoreError;
use crate::snapshot::SnapshotStore;
use crate::source::{LinkQuery, LinkStore, PageCursor, RawLink};
use crate::sweep::{spawn_sweeper, SweepHandle};

/// Cache key of the complete, date-ordered list.
pub const FULL_LIST_KEY: &str = "scraped_links_uploadedDate_all";

/// Cache key of an inclusive date-range query.
#[must_use]
pub fn range_key(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "scraped_links_{}_{}_all",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub type SharedLinks = Arc<Vec<LinkRecord>>;

/// One page of the ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<LinkRecord>,
    /// Resume point for the following page; `None` when this page is empty.
    pub next_cursor: Option<PageCursor>,
    /// `true` when the page came back full, so another page may exist.
    pub has_more: bool,
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<TimeBoxedCache<SharedLinks>>,
    snapshot: Option<SnapshotStore>,
}

impl LinkService {
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(store, clock, DEFAULT_CACHE_WINDOW)
    }

    #[must_use]
    pub fn with_window(store: Arc<dyn LinkStore>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            store,
            cache: Arc::new(TimeBoxedCache::with_window(clock, window)),
            snapshot: None,
        }
    }

    /// Mirrors every successful full fetch to `snapshot`.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: SnapshotStore) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    #[must_use]
    pub fn cache(&self) -> &TimeBoxedCache<SharedLinks> {
        &self.cache
    }

    /// Every record, ascending by upload date.
    ///
    /// A fresh cached list is returned without touching the store unless
    /// `force_refresh` is set. If the store fails, any cached list is served
    /// instead, stale or not.
    ///
    /// # Errors
    ///
    /// Returns the store's error only when nothing at all is cached.
    pub async fn fetch_all(&self, force_refresh: bool) -> Result<SharedLinks, StoreError> {
        if !force_refresh && self.cache.is_valid(FULL_LIST_KEY) {
            if let Some(cached) = self.cache.get(FULL_LIST_KEY) {
                tracing::debug!(records = cached.len(), "serving link list from cache");
                return Ok(cached);
            }
        }

        match self.store.query(&LinkQuery::all()).await {
            Ok(raw) => {
                let records: SharedLinks = Arc::new(decorate(raw));
                self.cache.set(FULL_LIST_KEY, Arc::clone(&records));
                if let Some(snapshot) = &self.snapshot {
                    snapshot.save(&records);
                }
                tracing::info!(records = records.len(), "fetched link list");
                Ok(records)
            }
            Err(err) => match self.cache.get(FULL_LIST_KEY) {
                Some(cached) => {
                    tracing::warn!(
                        error = %err,
                        records = cached.len(),
                        "link fetch failed, serving cached list"
                    );
                    Ok(cached)
                }
                None => Err(err),
            },
        }
    }

    /// Up to `page_size` records strictly after `cursor`. Pages are never
    /// cached.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn fetch_page(
        &self,
        page_size: u32,
        cursor: Option<&PageCursor>,
    ) -> Result<Page, StoreError> {
        if page_size == 0 {
            return Ok(Page {
                items: Vec::new(),
                next_cursor: None,
                has_more: false,
            });
        }

        let raw = self
            .store
            .query(&LinkQuery::page(page_size, cursor.cloned()))
            .await?;
        let next_cursor = raw.last().map(RawLink::cursor);
        let has_more = u32::try_from(raw.len()).is_ok_and(|n| n == page_size);
        Ok(Page {
            items: decorate(raw),
            next_cursor,
            has_more,
        })
    }

    /// Records with `start <= uploaded_date <= end`, ascending.
    ///
    /// # Errors
    ///
    /// Propagates the store's error. Unlike [`LinkService::fetch_all`] there
    /// is no stale fallback.
    pub async fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SharedLinks, StoreError> {
        let key = range_key(start, end);
        if self.cache.is_valid(&key) {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached);
            }
        }

        let raw = self.store.query(&LinkQuery::between(start, end)).await?;
        let records: SharedLinks = Arc::new(decorate(raw));
        tracing::debug!(%start, %end, records = records.len(), "fetched date range");
        self.cache.set(key, Arc::clone(&records));
        Ok(records)
    }

    /// Drops one cached key, or everything when `key` is `None`. Dropping the
    /// full list also clears the persisted snapshot.
    pub fn invalidate(&self, key: Option<&str>) {
        self.cache.invalidate(key);
        if key.is_none_or(|k| k == FULL_LIST_KEY) {
            if let Some(snapshot) = &self.snapshot {
                snapshot.clear();
            }
        }
    }

    /// Removes expired cache entries now.
    pub fn sweep(&self) -> usize {
        self.cache.sweep()
    }

    /// Sweeps the cache every `every` in the background until the handle is
    /// dropped.
    #[must_use]
    pub fn start_sweeper(&self, every: Duration) -> SweepHandle {
        spawn_sweeper(Arc::clone(&self.cache) as Arc<dyn Sweep>, every)
    }

    /// Seeds the full-list entry from a still-valid snapshot, keeping the
    /// snapshot's own timestamp so it expires when the original fetch would
    /// have. Returns whether anything was loaded.
    pub fn warm_from_snapshot(&self) -> bool {
        let Some(snapshot) = self.snapshot.as_ref().and_then(SnapshotStore::load) else {
            return false;
        };
        tracing::info!(
            records = snapshot.records.len(),
            fetched_at = snapshot.fetched_at,
            "restored link list from local snapshot"
        );
        self.cache
            .insert_at(FULL_LIST_KEY, Arc::new(snapshot.records), snapshot.fetched_at);
        true
    }
}

fn decorate(raw: Vec<RawLink>) -> Vec<LinkRecord> {
    raw.into_iter().map(RawLink::into_record).collect()
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
