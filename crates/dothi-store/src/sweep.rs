//! Periodic cache hygiene.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::Sweep;

/// Five minutes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Shortest period accepted by the background tasks; tokio intervals reject zero.
pub(crate) const MIN_TICK: Duration = Duration::from_millis(1);

/// Handle to a running sweeper. Dropping it stops the task.
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a task calling `target.sweep()` every `every`, starting one full
/// interval from now. Periods shorter than 1 ms are raised to 1 ms. Must be
/// called inside a tokio runtime.
pub fn spawn_sweeper(target: Arc<dyn Sweep>, every: Duration) -> SweepHandle {
    let every = every.max(MIN_TICK);
    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + every;
        let mut ticker = tokio::time::interval_at(start, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = target.sweep();
            if removed > 0 {
                tracing::debug!(removed, "cache sweep removed expired entries");
            }
        }
    });
    SweepHandle { task }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Sweep for Counting {
        fn sweep(&self) -> usize {
            self.calls.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_once_per_interval() {
        let target = Arc::new(Counting::default());
        let handle = spawn_sweeper(
            Arc::clone(&target) as Arc<dyn Sweep>,
            Duration::from_secs(300),
        );

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 3);

        assert!(handle.is_running());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_clamped() {
        let target = Arc::new(Counting::default());
        let handle = spawn_sweeper(Arc::clone(&target) as Arc<dyn Sweep>, Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(target.calls.load(Ordering::SeqCst) >= 1);
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_task() {
        let target = Arc::new(Counting::default());
        let handle = spawn_sweeper(
            Arc::clone(&target) as Arc<dyn Sweep>,
            Duration::from_secs(10),
        );
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
