// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer driver for the lifecycle operations.
//!
//! The four periodic operations share the running set, so they are mutually
//! excluded by serializing them onto this one task instead of taking a lock
//! per operation. Collaborator calls may block on I/O; collaborators never
//! call back into the manager.
//!
//! Shutdown is a watch channel: flipping it to `true` (or dropping the
//! sender) stops the loop, tears down all running bots gracefully and
//! returns. An operation in flight when shutdown arrives is simply not
//! started again; `tokio::select!` only ever runs one branch at a time, so
//! nothing is cancelled mid-mutation.

use crate::config::LifecycleConfig;
use crate::manager::BotLifecycleManager;
use crate::metrics::Lifecycle;
use crate::monitor::BotMonitor;
use crate::pool::BotPoolUpdater;
use hive_adapters::{BotClient, BotRegistry};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

/// Drives the lifecycle manager's periodic operations until shutdown.
pub struct Driver<R, C, P, M, L>
where
    R: BotRegistry,
    C: BotClient,
    P: BotPoolUpdater,
    M: BotMonitor,
    L: Lifecycle,
{
    manager: BotLifecycleManager<R, C, P, M, L>,
    config: LifecycleConfig,
    shutdown: watch::Receiver<bool>,
}

impl<R, C, P, M, L> Driver<R, C, P, M, L>
where
    R: BotRegistry,
    C: BotClient,
    P: BotPoolUpdater,
    M: BotMonitor,
    L: Lifecycle,
{
    pub fn new(
        manager: BotLifecycleManager<R, C, P, M, L>,
        config: LifecycleConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { manager, config, shutdown }
    }

    /// Run until the shutdown signal flips, then tear down running bots.
    ///
    /// Returns the manager so callers can inspect the final state.
    pub async fn run(mut self) -> BotLifecycleManager<R, C, P, M, L> {
        // Reconcile ticks immediately so the node converges on startup; the
        // sweepers wait out their first interval, there is nothing for them
        // to observe yet.
        let now = Instant::now();
        let mut reconcile = interval_at(now, self.config.reconcile_interval);
        let mut restart = interval_at(now + self.config.restart_interval, self.config.restart_interval);
        let mut inactivity =
            interval_at(now + self.config.inactivity_interval, self.config.inactivity_interval);
        let mut cleanup = interval_at(now + self.config.cleanup_interval, self.config.cleanup_interval);

        loop {
            tokio::select! {
                _ = reconcile.tick() => {
                    if let Err(err) = self.manager.manage_bots().await {
                        warn!(error = %err, "reconcile pass failed");
                    }
                }
                _ = restart.tick() => {
                    if let Err(err) = self.manager.restart_exited_bots().await {
                        warn!(error = %err, "restart sweep failed");
                    }
                }
                _ = inactivity.tick() => {
                    if let Err(err) = self.manager.exit_inactive_bots().await {
                        warn!(error = %err, "inactivity sweep failed");
                    }
                }
                _ = cleanup.tick() => {
                    if let Err(err) = self.manager.cleanup_unused_bots().await {
                        warn!(error = %err, "cleanup sweep failed");
                    }
                }
                changed = self.shutdown.changed() => {
                    // Err means the sender is gone; treat it as shutdown too.
                    if changed.is_ok() && !*self.shutdown.borrow_and_update() {
                        continue;
                    }
                    info!("shutting down bot lifecycle driver");
                    self.manager.tear_down_running_bots().await;
                    return self.manager;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
