// ABOUTME: Auto mode that repeats capture-and-analyze on a fixed interval
// ABOUTME: Runs never overlap; a slow analysis delays the next tick instead of stacking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Interval between automatic analyses
pub const AUTO_ANALYSIS_INTERVAL: Duration = Duration::from_secs(4);

/// Periodic runner for form analysis
#[derive(Debug, Clone, Copy)]
pub struct AutoAnalyzer {
    period: Duration,
}

impl Default for AutoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoAnalyzer {
    /// Runner using the standard 4 second interval
    #[must_use]
    pub const fn new() -> Self {
        Self {
            period: AUTO_ANALYSIS_INTERVAL,
        }
    }

    /// Runner with a custom interval
    #[must_use]
    pub const fn with_period(period: Duration) -> Self {
        Self { period }
    }

    /// Start calling `run` every period until the handle is stopped
    ///
    /// The first run happens one period after the start. `run` is awaited
    /// before the next tick is considered.
    pub fn spawn<F, Fut>(self, mut run: F) -> AutoAnalyzerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        run().await;
                        runs += 1;
                        debug!(runs, "Auto analysis run finished");
                    }
                }
            }
            runs
        });

        AutoAnalyzerHandle { stop_tx, task }
    }
}

/// Handle to a running auto mode
pub struct AutoAnalyzerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl AutoAnalyzerHandle {
    /// True until the loop has exited
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop, waiting for an in-flight run, and return the number of runs
    pub async fn stop(self) -> u64 {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(runs) => runs,
            Err(e) => {
                warn!("Auto analysis task ended abnormally: {e}");
                0
            }
        }
    }
}
