//! Visitor counting against the Firebase Realtime Database REST API.
//!
//! The counter is an external collaborator: failures are logged and never
//! surface to callers of [`VisitorTracker`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dothi_core::{AppConfig, Clock};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::TimeBoxedCache;
use crate::error::StoreError;
use crate::retry::{check_status, retry_with_backoff};
use crate::sweep::MIN_TICK;

/// One minute.
pub const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorStats {
    pub total: u64,
    pub today: u64,
}

#[async_trait]
pub trait VisitorCounter: Send + Sync {
    /// Counts one visit towards the running total and `day`'s tally.
    async fn increment(&self, day: NaiveDate) -> Result<(), StoreError>;

    async fn stats(&self, day: NaiveDate) -> Result<VisitorStats, StoreError>;
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Client for the `visitors/` subtree of a Realtime Database.
pub struct RealtimeDbClient {
    client: Client,
    base_url: Url,
    auth: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RealtimeDbClient {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, auth: Option<&str>, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            auth: auth.map(str::to_owned),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// `None` when no database URL is configured.
    ///
    /// # Errors
    ///
    /// Same as [`RealtimeDbClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, StoreError> {
        let Some(url) = config.rtdb_url.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(url, config.rtdb_auth.as_deref(), config.request_timeout_secs)?
            .with_retries(config.max_retries, config.retry_backoff_base_ms);
        Ok(Some(client))
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// `(request URL, URL safe to log)` for a database path.
    fn locate(&self, path: &str) -> Result<(Url, String), StoreError> {
        let mut url = self
            .base_url
            .join(&format!("{path}.json"))
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        let shown = url.to_string();
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok((url, shown))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(), StoreError> {
        let (url, shown) = self.locate(path)?;
        let (url, shown) = (&url, shown.as_str());
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.put(url.clone()).json(body).send().await?;
            check_status(&response, shown)
        })
        .await
    }

    /// Single-shot write for server-side increments. A timed-out request may
    /// still have been applied, so it is never resent.
    async fn put_once(&self, path: &str, body: &Value) -> Result<(), StoreError> {
        let (url, shown) = self.locate(path)?;
        let response = self.client.put(url).json(body).send().await?;
        check_status(&response, &shown)
    }

    /// Reads a counter node; an absent node reads as zero.
    async fn read_count(&self, path: &str) -> Result<u64, StoreError> {
        let (url, shown) = self.locate(path)?;
        let (url, shown) = (&url, shown.as_str());
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            check_status(&response, shown)?;
            let text = response.text().await?;
            let count: Option<u64> =
                serde_json::from_str(&text).map_err(|source| StoreError::Deserialize {
                    context: format!("counter {shown}"),
                    source,
                })?;
            Ok(count.unwrap_or(0))
        })
        .await
    }
}

#[async_trait]
impl VisitorCounter for RealtimeDbClient {
    async fn increment(&self, day: NaiveDate) -> Result<(), StoreError> {
        let bump = json!({ ".sv": { "increment": 1 } });
        self.put_once("visitors/total", &bump).await?;
        self.put_once(&format!("visitors/daily/{}", day_key(day)), &bump)
            .await?;
        self.put("visitors/lastUpdate", &json!({ ".sv": "timestamp" }))
            .await
    }

    async fn stats(&self, day: NaiveDate) -> Result<VisitorStats, StoreError> {
        let total = self.read_count("visitors/total").await?;
        let today = self
            .read_count(&format!("visitors/daily/{}", day_key(day)))
            .await?;
        Ok(VisitorStats { total, today })
    }
}

/// Per-session visit recording and cached stats reads.
pub struct VisitorTracker {
    counter: Arc<dyn VisitorCounter>,
    clock: Arc<dyn Clock>,
    cache: TimeBoxedCache<VisitorStats>,
    visited_on: Mutex<Option<NaiveDate>>,
}

impl VisitorTracker {
    #[must_use]
    pub fn new(counter: Arc<dyn VisitorCounter>, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(counter, clock, DEFAULT_STATS_WINDOW)
    }

    #[must_use]
    pub fn with_window(
        counter: Arc<dyn VisitorCounter>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            cache: TimeBoxedCache::with_window(Arc::clone(&clock), window),
            counter,
            clock,
            visited_on: Mutex::new(None),
        }
    }

    /// Counts this session's visit unless it was already attempted today.
    /// Returns whether the counter acknowledged the increment. A failed
    /// attempt still uses up the day, since the write may have landed.
    pub async fn record_visit(&self) -> bool {
        let today = self.clock.today();
        {
            let mut visited = self.visited_on.lock().unwrap_or_else(PoisonError::into_inner);
            if *visited == Some(today) {
                return false;
            }
            *visited = Some(today);
        }

        match self.counter.increment(today).await {
            Ok(()) => {
                self.cache.invalidate(Some(&stats_key(today)));
                tracing::info!(day = %today, "visit counted");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to count visit");
                false
            }
        }
    }

    /// Current totals, cached for the stats window. Failures read as zero and
    /// are not cached.
    pub async fn stats(&self) -> VisitorStats {
        let today = self.clock.today();
        let key = stats_key(today);
        if self.cache.is_valid(&key) {
            if let Some(stats) = self.cache.get(&key) {
                return stats;
            }
        }

        match self.counter.stats(today).await {
            Ok(stats) => {
                self.cache.set(key, stats);
                stats
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read visitor stats");
                VisitorStats::default()
            }
        }
    }

    /// Drops cached stats and reads them again.
    pub async fn refresh(&self) -> VisitorStats {
        self.cache.invalidate(None);
        self.stats().await
    }

    /// Polls the counter every `every` and calls `on_change` with the first
    /// reading and then whenever the stats differ from the last delivered
    /// value. Periods shorter than 1 ms are raised to 1 ms. Must be called
    /// inside a tokio runtime.
    pub fn subscribe<F>(&self, every: Duration, on_change: F) -> Subscription
    where
        F: Fn(VisitorStats) + Send + 'static,
    {
        let counter = Arc::clone(&self.counter);
        let clock = Arc::clone(&self.clock);
        let every = every.max(MIN_TICK);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<VisitorStats> = None;
            loop {
                ticker.tick().await;
                match counter.stats(clock.today()).await {
                    Ok(stats) if last != Some(stats) => {
                        last = Some(stats);
                        on_change(stats);
                    }
                    Ok(_) => {}
                    Err(err) => tracing::debug!(error = %err, "visitor stats poll failed"),
                }
            }
        });
        Subscription { task }
    }
}

fn stats_key(day: NaiveDate) -> String {
    format!("visitor_stats_{}", day_key(day))
}

/// Live stats feed. Dropping it stops polling.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use dothi_core::ManualClock;

    use super::*;

    #[derive(Default)]
    struct FakeCounter {
        total: AtomicU64,
        increments: AtomicUsize,
        stats_reads: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
    }

    impl FakeCounter {
        fn fail(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::UnexpectedStatus {
                    status: 500,
                    url: "rtdb".to_owned(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl VisitorCounter for FakeCounter {
        async fn increment(&self, _day: NaiveDate) -> Result<(), StoreError> {
            self.check()?;
            self.increments.fetch_add(1, Ordering::SeqCst);
            self.total.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stats(&self, _day: NaiveDate) -> Result<VisitorStats, StoreError> {
            self.check()?;
            self.stats_reads.fetch_add(1, Ordering::SeqCst);
            let total = self.total.load(Ordering::SeqCst);
            Ok(VisitorStats { total, today: total })
        }
    }

    fn tracker(counter: &Arc<FakeCounter>, clock: &Arc<ManualClock>) -> VisitorTracker {
        VisitorTracker::new(
            Arc::clone(counter) as Arc<dyn VisitorCounter>,
            Arc::clone(clock) as Arc<dyn Clock>,
        )
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[tokio::test]
    async fn records_once_per_day() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);

        assert!(tracker.record_visit().await);
        assert!(!tracker.record_visit().await);
        assert_eq!(counter.increments.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(24 * 60 * 60));
        assert!(tracker.record_visit().await);
        assert_eq!(counter.increments.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_increment_is_not_repeated_the_same_day() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);

        counter.fail(true);
        assert!(!tracker.record_visit().await);
        counter.fail(false);
        assert!(!tracker.record_visit().await);
        assert_eq!(counter.increments.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_secs(24 * 60 * 60));
        assert!(tracker.record_visit().await);
        assert_eq!(counter.increments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stats_are_cached_for_a_minute() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);

        assert_eq!(tracker.stats().await, VisitorStats::default());
        counter.total.store(5, Ordering::SeqCst);
        assert_eq!(tracker.stats().await.total, 0);
        assert_eq!(counter.stats_reads.load(Ordering::SeqCst), 1);

        clock.advance(DEFAULT_STATS_WINDOW);
        assert_eq!(tracker.stats().await.total, 5);
    }

    #[tokio::test]
    async fn visit_invalidates_cached_stats() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);

        assert_eq!(tracker.stats().await.total, 0);
        tracker.record_visit().await;
        assert_eq!(tracker.stats().await, VisitorStats { total: 1, today: 1 });
    }

    #[tokio::test]
    async fn failing_counter_reads_as_zero() {
        let counter = Arc::new(FakeCounter::default());
        counter.total.store(9, Ordering::SeqCst);
        counter.fail(true);
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);

        assert_eq!(tracker.stats().await, VisitorStats::default());
        counter.fail(false);
        assert_eq!(tracker.stats().await.total, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_reports_changes_until_dropped() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let sub = tracker.subscribe(Duration::from_secs(10), move |stats| {
            sink.lock().unwrap().push(stats.total);
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        counter.total.store(3, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 3]);

        sub.unsubscribe();
        counter.total.store(4, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_subscription_still_polls() {
        let counter = Arc::new(FakeCounter::default());
        let clock = Arc::new(ManualClock::at_date(june(9)));
        let tracker = tracker(&counter, &clock);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let sub = tracker.subscribe(Duration::ZERO, move |stats| {
            sink.lock().unwrap().push(stats.total);
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0]);
        assert!(sub.is_active());
    }
}
