//! # File Watcher
//!
//! Polls the stock spreadsheet's modification time and reconciles when an
//! external edit is detected.
//!
//! ## State Machine
//!
//! `Stopped -> Running` on [`FileWatcher::spawn`], `Running -> Stopped` on
//! [`WatcherHandle::stop`]. While running, every tick:
//!
//! - file unreadable or missing: skip the tick silently
//! - first observation: seed the stamp, do not reconcile
//! - stamp differs from the recorded one: reconcile once
//! - reconciliation error: log it, wait the error backoff, keep running
//!
//! The stamp is updated to the observed value on every tick that reads it,
//! whether or not the reconciliation succeeds.
//!
//! Reconciliation is awaited outside the `select!` on the stop signal, so
//! stopping never interrupts one in flight and ticks never overlap.

pub mod stamp;

pub use stamp::{modified_time, ModifiedStamp};

use crate::reconciler::{Reconcile, SpreadsheetSource, StockSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub struct FileWatcher {
    sheet: SpreadsheetSource,
    reconciler: Arc<dyn Reconcile>,
    interval: Duration,
    error_backoff: Duration,
}

impl FileWatcher {
    pub fn new(
        sheet: SpreadsheetSource,
        reconciler: Arc<dyn Reconcile>,
        interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            sheet,
            reconciler,
            interval,
            error_backoff,
        }
    }

    /// Starts the polling task.
    pub fn spawn(self) -> WatcherHandle {
        let stop = Arc::new(Notify::new());
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(self.run(stop.clone(), running.clone()));
        WatcherHandle {
            stop,
            running,
            task,
        }
    }

    async fn run(self, stop: Arc<Notify>, running: Arc<AtomicBool>) {
        let path = self.sheet.path().to_path_buf();
        let stamp = self.sheet.stamp().clone();
        let source = StockSource::Spreadsheet(self.sheet);
        info!(path = %path.display(), interval_ms = self.interval.as_millis() as u64, "Watcher started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop.notified() => break,
                _ = ticker.tick() => {}
            }

            let Some((previous, observed)) = stamp.observe(&path) else {
                continue;
            };
            match previous {
                None => {
                    debug!(path = %path.display(), "Seeded modification stamp");
                    continue;
                }
                Some(previous) if previous == observed => continue,
                Some(_) => {}
            }

            info!(path = %path.display(), "Spreadsheet changed, reconciling");
            match self.reconciler.reconcile(&source).await {
                Ok(result) => info!(change_count = result.change_count, "Sync complete"),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Sync failed");
                    tokio::select! {
                        _ = stop.notified() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                    ticker.reset();
                }
            }
        }

        running.store(false, Ordering::SeqCst);
        info!(path = %path.display(), "Watcher stopped");
    }
}

/// Owner's handle on a running [`FileWatcher`].
pub struct WatcherHandle {
    stop: Arc<Notify>,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Signals the watcher and waits for it to exit. A reconciliation in
    /// progress finishes first.
    pub async fn stop(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            error!(error = %e, "Watcher task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_tracker::ChangeSet;
    use crate::error::StockError;
    use crate::reconciler::Reconciliation;
    use async_trait::async_trait;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::SystemTime;

    /// Counts calls; optionally slow or failing.
    #[derive(Default)]
    struct CountingReconciler {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl Reconcile for CountingReconciler {
        async fn reconcile(&self, _source: &StockSource) -> Result<Reconciliation, StockError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(StockError::MalformedSource("no Product column".to_string()));
            }
            Ok(Reconciliation {
                changes: ChangeSet::default(),
                change_count: 0,
            })
        }
    }

    fn touch(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    async fn wait_for(cond: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cond()
    }

    fn setup(dir: &tempfile::TempDir) -> (SpreadsheetSource, std::path::PathBuf) {
        let path = dir.path().join("stock.csv");
        fs::write(&path, "Product,Quantity\nA,1\n").unwrap();
        touch(&path, 1_000);
        (SpreadsheetSource::new(&path, ModifiedStamp::new()), path)
    }

    #[tokio::test]
    async fn test_first_observation_only_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let (sheet, _path) = setup(&dir);
        let stamp = sheet.stamp().clone();
        let fake = Arc::new(CountingReconciler::default());

        let handle = FileWatcher::new(sheet, fake.clone(), Duration::from_millis(10), Duration::ZERO).spawn();
        assert!(wait_for(|| stamp.get().is_some()).await);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        assert!(handle.is_running());
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_one_reconcile_per_change() {
        let dir = tempfile::tempdir().unwrap();
        let (sheet, path) = setup(&dir);
        let stamp = sheet.stamp().clone();
        // Slower than the poll interval: ticks must not overlap.
        let fake = Arc::new(CountingReconciler {
            delay: Duration::from_millis(80),
            ..Default::default()
        });

        let handle = FileWatcher::new(sheet, fake.clone(), Duration::from_millis(10), Duration::ZERO).spawn();
        assert!(wait_for(|| stamp.get().is_some()).await);

        touch(&path, 2_000);
        assert!(wait_for(|| fake.calls.load(Ordering::SeqCst) == 1).await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);

        touch(&path, 3_000);
        assert!(wait_for(|| fake.calls.load(Ordering::SeqCst) == 2).await);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_own_write_is_not_reprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let (sheet, path) = setup(&dir);
        let writer = sheet.clone();
        let stamp = sheet.stamp().clone();
        let fake = Arc::new(CountingReconciler::default());

        let handle = FileWatcher::new(sheet, fake.clone(), Duration::from_millis(10), Duration::ZERO).spawn();
        assert!(wait_for(|| stamp.get().is_some()).await);

        let stock = [("A".to_string(), 7)].into();
        writer.write_stock(&stock).unwrap();
        assert_eq!(stamp.get(), modified_time(&path));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_failure_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let (sheet, path) = setup(&dir);
        let stamp = sheet.stamp().clone();
        let fake = Arc::new(CountingReconciler {
            fail: true,
            ..Default::default()
        });

        let handle = FileWatcher::new(
            sheet,
            fake.clone(),
            Duration::from_millis(10),
            Duration::from_millis(30),
        )
        .spawn();
        assert!(wait_for(|| stamp.get().is_some()).await);

        touch(&path, 2_000);
        assert!(wait_for(|| fake.calls.load(Ordering::SeqCst) == 1).await);
        // The stamp moved even though the sync failed; no retry until the next edit.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_running());

        touch(&path, 3_000);
        assert!(wait_for(|| fake.calls.load(Ordering::SeqCst) == 2).await);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = SpreadsheetSource::new(dir.path().join("later.csv"), ModifiedStamp::new());
        let stamp = sheet.stamp().clone();
        let fake = Arc::new(CountingReconciler::default());

        let handle = FileWatcher::new(sheet, fake.clone(), Duration::from_millis(10), Duration::ZERO).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stamp.get(), None);
        assert!(handle.is_running());

        handle.stop().await;
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_reconcile() {
        let dir = tempfile::tempdir().unwrap();
        let (sheet, path) = setup(&dir);
        let stamp = sheet.stamp().clone();
        let fake = Arc::new(CountingReconciler {
            delay: Duration::from_millis(150),
            ..Default::default()
        });

        let handle = FileWatcher::new(sheet, fake.clone(), Duration::from_millis(10), Duration::ZERO).spawn();
        assert!(wait_for(|| stamp.get().is_some()).await);
        touch(&path, 2_000);
        assert!(wait_for(|| fake.calls.load(Ordering::SeqCst) == 1).await);

        let started = std::time::Instant::now();
        handle.stop().await;
        // The stop had to wait out most of the 150ms reconciliation.
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
