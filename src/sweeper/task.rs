/*!
 * Expiry Sweeper Task
 *
 * Background task that periodically removes expired nodes from every loaded
 * holder. Reads never depend on it: cached views already ignore dead nodes,
 * the sweeper only reclaims memory and storage.
 */

use crate::core::limits::MIN_SWEEP_INTERVAL;
use crate::permissions::{PermissionManager, SweepReport};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Control messages for the sweeper task
#[derive(Debug, Clone)]
pub enum SweeperCommand {
    /// Change the sweep period
    UpdateInterval(Duration),
    /// Stop periodic sweeps; triggers still run
    Pause,
    /// Resume periodic sweeps
    Resume,
    /// Sweep immediately
    Trigger,
    /// Shutdown the sweeper task
    Shutdown,
}

/// Running totals across sweeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweeperStats {
    pub sweeps: u64,
    pub totals: SweepReport,
}

/// Handle to the sweeper background task
pub struct ExpirySweeper {
    command_tx: mpsc::UnboundedSender<SweeperCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
    stats: Arc<Mutex<SweeperStats>>,
}

impl ExpirySweeper {
    /// Spawn the sweeper on the current tokio runtime
    pub fn spawn(manager: PermissionManager, interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(SweeperStats::default()));
        let interval = interval.max(MIN_SWEEP_INTERVAL);

        let loop_stats = Arc::clone(&stats);
        let handle = tokio::spawn(async move {
            run_sweeper_loop(manager, interval, command_rx, loop_stats).await;
        });

        info!("Expiry sweeper spawned ({:?} interval)", interval);

        Self {
            command_tx,
            handle: Some(handle),
            stats,
        }
    }

    /// Change the sweep period
    pub fn update_interval(&self, interval: Duration) {
        let _ = self
            .command_tx
            .send(SweeperCommand::UpdateInterval(interval));
    }

    /// Pause periodic sweeps
    pub fn pause(&self) {
        let _ = self.command_tx.send(SweeperCommand::Pause);
    }

    /// Resume periodic sweeps
    pub fn resume(&self) {
        let _ = self.command_tx.send(SweeperCommand::Resume);
    }

    /// Sweep immediately, even while paused
    pub fn trigger(&self) {
        let _ = self.command_tx.send(SweeperCommand::Trigger);
    }

    pub fn stats(&self) -> SweeperStats {
        *self.stats.lock()
    }

    /// Shutdown the sweeper task gracefully
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(SweeperCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Expiry sweeper shutdown error: {}", e);
            } else {
                info!("Expiry sweeper shutdown complete");
            }
        }
    }
}

fn sweep(manager: &PermissionManager, stats: &Mutex<SweeperStats>) {
    let report = manager.sweep_expired(SystemTime::now());
    let mut stats = stats.lock();
    stats.sweeps += 1;
    stats.totals.merge(report);
    if report.nodes_removed > 0 {
        debug!(
            "Sweep removed {} nodes from {} holders",
            report.nodes_removed, report.holders_changed
        );
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_sweeper_loop(
    manager: PermissionManager,
    period: Duration,
    mut command_rx: mpsc::UnboundedReceiver<SweeperCommand>,
    stats: Arc<Mutex<SweeperStats>>,
) {
    let mut active = true;
    let mut interval = ticker(period);

    info!("Sweeper loop started with {:?} period", period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if active {
                    sweep(&manager, &stats);
                }
            }

            command = command_rx.recv() => {
                let Some(command) = command else {
                    // Every handle is gone
                    break;
                };
                match command {
                    SweeperCommand::UpdateInterval(period) => {
                        let period = period.max(MIN_SWEEP_INTERVAL);
                        info!("Sweep interval updated: {:?}", period);
                        interval = ticker(period);
                    }

                    SweeperCommand::Pause => {
                        info!("Expiry sweeper paused");
                        active = false;
                    }

                    SweeperCommand::Resume => {
                        info!("Expiry sweeper resumed");
                        active = true;
                    }

                    SweeperCommand::Trigger => {
                        sweep(&manager, &stats);
                        log::trace!("Manual sweep trigger");
                    }

                    SweeperCommand::Shutdown => {
                        info!("Expiry sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(SweeperCommand::Shutdown);
        }
    }
}
