//! Background reclaim daemon.
//!
//! Periodically sweeps the repository caches, evicting records and group
//! lists that stayed unobserved for two consecutive sweeps. The sweep is
//! cache-only and can never fail on store errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::time::interval;

use crate::services::repository::{Repository, SweepReport};

/// Configuration for the reclaim daemon.
#[derive(Debug, Clone)]
pub struct ReclaimConfig {
    /// Interval between sweeps.
    pub interval: Duration,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

impl ReclaimConfig {
    /// Config with a custom sweep interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Config for frequent sweeps (testing).
    pub fn frequent() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Status counters of the reclaim daemon.
#[derive(Debug, Clone, Default)]
pub struct ReclaimStatus {
    /// Whether the sweep loop is running.
    pub running: bool,
    /// Total sweeps performed.
    pub total_sweeps: u64,
    /// Records evicted over the daemon's lifetime.
    pub evicted_records: u64,
    /// Lists evicted over the daemon's lifetime.
    pub evicted_lists: u64,
}

/// Handle to observe and stop a running reclaim daemon.
pub struct ReclaimHandle {
    stop_flag: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    status: Arc<RwLock<ReclaimStatus>>,
}

impl ReclaimHandle {
    /// Request the sweep loop to stop. In-flight work completes; no further
    /// sweeps run.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        // notify_one stores a permit, so a stop issued while the loop is
        // mid-sweep is still seen on its next wait.
        self.stop_signal.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Current daemon status.
    pub async fn status(&self) -> ReclaimStatus {
        self.status.read().await.clone()
    }
}

/// Periodic cache sweeper for a [`Repository`].
pub struct ReclaimDaemon {
    repository: Arc<Repository>,
    config: ReclaimConfig,
    status: Arc<RwLock<ReclaimStatus>>,
    stop_flag: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
}

impl ReclaimDaemon {
    pub fn new(repository: Arc<Repository>, config: ReclaimConfig) -> Self {
        Self {
            repository,
            config,
            status: Arc::new(RwLock::new(ReclaimStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
        }
    }

    /// Create with the default configuration.
    pub fn with_defaults(repository: Arc<Repository>) -> Self {
        Self::new(repository, ReclaimConfig::default())
    }

    /// Get a handle to control the daemon.
    pub fn handle(&self) -> ReclaimHandle {
        ReclaimHandle {
            stop_flag: self.stop_flag.clone(),
            stop_signal: self.stop_signal.clone(),
            status: self.status.clone(),
        }
    }

    /// Spawn the sweep loop onto the runtime and return its control handle.
    pub fn spawn(self) -> ReclaimHandle {
        let handle = self.handle();
        tokio::spawn(async move {
            self.run_loop().await;
        });
        handle
    }

    /// Run a single sweep (for tests or manual invocation).
    pub async fn run_once(&self) -> SweepReport {
        let report = self.repository.run_sweep().await;
        self.record_report(report).await;
        report
    }

    /// Get configuration.
    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    async fn run_loop(self) {
        {
            let mut status = self.status.write().await;
            status.running = true;
        }
        tracing::debug!(interval = ?self.config.interval, "reclaim daemon started");

        let mut ticker = interval(self.config.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    let report = self.repository.run_sweep().await;
                    self.record_report(report).await;
                }
                () = self.stop_signal.notified() => {
                    break;
                }
            }
        }

        {
            let mut status = self.status.write().await;
            status.running = false;
        }
        tracing::debug!("reclaim daemon stopped");
    }

    async fn record_report(&self, report: SweepReport) {
        let mut status = self.status.write().await;
        status.total_sweeps += 1;
        status.evicted_records += report.evicted_records as u64;
        status.evicted_lists += report.evicted_lists as u64;
    }
}
