//! Periodic trigger for the popular sync.
//!
//! The scheduler owns no timing logic of its own: it waits on an injected
//! [`Ticker`] and runs [`SyncJob::sync_popular`] on every tick. Production
//! uses [`IntervalTicker`]; tests drive it by hand.

mod config;
mod ticker;

pub use config::SchedulerConfig;
pub use ticker::{IntervalTicker, Ticker};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::sync::{SyncError, SyncJob};

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    /// Ticks that started a run.
    pub runs_triggered: u64,
    /// Ticks skipped because a run was already in progress.
    pub runs_skipped: u64,
}

/// Runs the popular sync on every tick.
pub struct SyncScheduler {
    job: Arc<SyncJob>,
    max_pages: u32,

    // Runtime state
    running: Arc<AtomicBool>,
    runs_triggered: Arc<AtomicU64>,
    runs_skipped: Arc<AtomicU64>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    /// Create a new scheduler. Each run walks `max_pages` listing pages.
    pub fn new(job: Arc<SyncJob>, max_pages: u32) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            job,
            max_pages,
            running: Arc::new(AtomicBool::new(false)),
            runs_triggered: Arc::new(AtomicU64::new(0)),
            runs_skipped: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// Start the scheduler loop (spawns a background task).
    pub async fn start<T: Ticker + 'static>(&self, mut ticker: T) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let runs_triggered = Arc::clone(&self.runs_triggered);
        let runs_skipped = Arc::clone(&self.runs_skipped);
        let job = Arc::clone(&self.job);
        let max_pages = self.max_pages;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!("Sync scheduler started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sync scheduler received shutdown signal");
                        break;
                    }
                    ticked = ticker.tick() => {
                        if !ticked {
                            info!("Tick source closed");
                            break;
                        }
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }

                        match job.sync_popular(max_pages).await {
                            Ok(summary) => {
                                runs_triggered.fetch_add(1, Ordering::SeqCst);
                                info!(
                                    "Scheduled sync completed: processed={}, failed={}",
                                    summary.processed_count, summary.failed_count
                                );
                            }
                            Err(SyncError::AlreadyRunning) => {
                                runs_skipped.fetch_add(1, Ordering::SeqCst);
                                info!("Scheduled sync skipped: a run is already in progress");
                            }
                            Err(e) => {
                                runs_triggered.fetch_add(1, Ordering::SeqCst);
                                error!("Scheduled sync failed: {}", e);
                            }
                        }
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("Sync scheduler stopped");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Stop the scheduler and wait for the loop to exit.
    ///
    /// A run in progress is allowed to finish.
    ///
    /// The task handle is reaped even if the loop already ended on its own.
    pub async fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping sync scheduler");
            let _ = self.shutdown_tx.send(());
        } else {
            debug!("Scheduler loop not running");
        }

        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Scheduler task ended abnormally: {}", e);
            }
        }
    }

    /// Get current scheduler status.
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running.load(Ordering::SeqCst),
            runs_triggered: self.runs_triggered.load(Ordering::SeqCst),
            runs_skipped: self.runs_skipped.load(Ordering::SeqCst),
        }
    }
}
