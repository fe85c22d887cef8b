// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot lifecycle management: reconcile, restart, reap, cleanup, teardown.
//!
//! The manager owns the node's belief about which bots are running
//! (`running_bots`) and converges it toward the registry's assignment set by
//! at most one step per bot per pass. Per-bot failures are absorbed and
//! reported as metrics so one poisoned assignment cannot stall the rest of
//! the fleet; only failures that void a whole pass (a registry or container
//! listing error) are returned to the driver.
//!
//! The five operations share `running_bots` and must not run concurrently;
//! the [`Driver`](crate::Driver) serializes them onto one task.

use crate::metrics::{codes, Lifecycle};
use crate::monitor::BotMonitor;
use crate::pool::BotPoolUpdater;
use hive_adapters::{BotClient, BotRegistry, ContainerError, RegistryError};
use hive_core::{bot_ids, diff, BotConfig, BotDiff, ContainerRecord};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Fatal per-pass errors returned to the driver.
///
/// Per-bot failures never surface here; they are absorbed and reported
/// through the metrics sink.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to load assigned bots: {0}")]
    LoadAssignedBots(#[source] RegistryError),

    #[error("failed to list bot containers: {0}")]
    LoadBotContainers(#[source] ContainerError),
}

/// Supervises the node's bot fleet against the registry's assignments.
pub struct BotLifecycleManager<R, C, P, M, L>
where
    R: BotRegistry,
    C: BotClient,
    P: BotPoolUpdater,
    M: BotMonitor,
    L: Lifecycle,
{
    registry: R,
    containers: C,
    pool: P,
    monitor: M,
    metrics: L,
    /// Bots this node believes are running. Mutated only by `manage_bots`
    /// and `tear_down_running_bots`; the sweepers read it.
    running_bots: Vec<BotConfig>,
    /// Per-bot budget for container teardown.
    bot_remove_timeout: Duration,
}

impl<R, C, P, M, L> BotLifecycleManager<R, C, P, M, L>
where
    R: BotRegistry,
    C: BotClient,
    P: BotPoolUpdater,
    M: BotMonitor,
    L: Lifecycle,
{
    pub fn new(
        registry: R,
        containers: C,
        pool: P,
        monitor: M,
        metrics: L,
        bot_remove_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            containers,
            pool,
            monitor,
            metrics,
            running_bots: Vec::new(),
            bot_remove_timeout,
        }
    }

    /// Bots the manager currently believes are running.
    pub fn running_bots(&self) -> &[BotConfig] {
        &self.running_bots
    }

    /// One reconcile pass: converge the running set toward the latest
    /// assignments.
    ///
    /// A bot whose image pull or launch fails is excluded from the new
    /// running set; the diff re-adds it next pass as long as it stays
    /// assigned. The pool hears about removals before their containers are
    /// torn down, and `update_bots_with_latest_configs` is the last pool
    /// call of the pass.
    pub async fn manage_bots(&mut self) -> Result<(), LifecycleError> {
        let latest = match self.registry.load_assigned_bots().await {
            Ok(bots) => bots,
            Err(err) => {
                self.metrics.system_error(codes::LOAD_ASSIGNED_BOTS, &err);
                return Err(LifecycleError::LoadAssignedBots(err));
            }
        };

        let BotDiff { added, removed } = diff(&self.running_bots, &latest);

        // Bots excluded from this pass's running set.
        let mut failed: Vec<BotConfig> = Vec::new();
        let mut launchable: Vec<BotConfig> = Vec::new();

        if !added.is_empty() {
            let results = self.containers.ensure_bot_images(&added).await;
            for (bot, result) in added.into_iter().zip(results) {
                match result {
                    Ok(()) => launchable.push(bot),
                    Err(err) => {
                        warn!(bot_id = %bot.id, error = %err, "bot image unavailable, skipping launch");
                        self.metrics.bot_error(codes::PULL_IMAGE, &err, &bot.id);
                        failed.push(bot);
                    }
                }
            }
        }

        for bot in launchable {
            info!(bot_id = %bot.id, container = %bot.container_name(), "launching bot");
            if let Err(err) = self.containers.launch_bot(&bot).await {
                warn!(bot_id = %bot.id, error = %err, "failed to launch bot");
                self.metrics.bot_error(codes::LAUNCH_BOT, &err, &bot.id);
                failed.push(bot);
            }
        }

        if !removed.is_empty() {
            // Drain the pool's channels before the containers go away.
            self.pool.remove_bots_with_configs(&removed).await;
            self.metrics.status_stopping(&removed);
            for bot in &removed {
                self.tear_down_bot(bot, true).await;
            }
        }

        self.running_bots = latest.into_iter().filter(|bot| !failed.contains(bot)).collect();

        self.metrics.status_running(&self.running_bots);
        self.pool.update_bots_with_latest_configs(&self.running_bots).await;
        self.monitor.monitor_bots(bot_ids(&self.running_bots));
        Ok(())
    }

    /// Restart containers of known bots that have exited.
    ///
    /// Intended for a faster timer than reconcile: `status_running` reflects
    /// post-reconcile intent, and this sweep repairs the divergence when a
    /// container dies underneath it.
    pub async fn restart_exited_bots(&self) -> Result<(), LifecycleError> {
        let containers = self
            .containers
            .load_bot_containers()
            .await
            .map_err(LifecycleError::LoadBotContainers)?;
        let by_name: HashMap<&str, &ContainerRecord> =
            containers.iter().map(|record| (record.name(), record)).collect();

        let mut reconnect: Vec<BotConfig> = Vec::new();
        for bot in &self.running_bots {
            let name = bot.container_name();
            let Some(record) = by_name.get(name.as_str()) else {
                continue;
            };
            if !record.is_exited() {
                continue;
            }

            info!(bot_id = %bot.id, container_id = %record.id, "restarting exited bot container");
            self.metrics.action_restart(bot);
            match self.containers.start_wait_bot_container(&record.id).await {
                Ok(()) => reconnect.push(bot.clone()),
                Err(err) => {
                    warn!(bot_id = %bot.id, error = %err, "failed to start exited bot container");
                    self.metrics.bot_error(codes::START_EXITED_BOT_CONTAINER, &err, &bot.id);
                }
            }
        }

        // Called even when empty so the pool can reconcile its own state.
        self.pool.reconnect_to_bots_with_configs(&reconnect).await;
        Ok(())
    }

    /// Stop bots the monitor reports as inactive.
    ///
    /// The running set is left untouched. If the registry still assigns the
    /// bot, the restart sweeper will observe the exited container and bring
    /// it back with a fresh process; if the assignment is gone, the next
    /// reconcile removes it for good.
    pub async fn exit_inactive_bots(&self) -> Result<(), LifecycleError> {
        for bot_id in self.monitor.get_inactive_bots() {
            let Some(bot) = self.running_bots.iter().find(|b| b.id == bot_id) else {
                continue;
            };
            info!(bot_id = %bot.id, "stopping inactive bot");
            if let Err(err) = self.containers.stop_bot(bot).await {
                warn!(bot_id = %bot.id, error = %err, "failed to stop inactive bot");
                self.metrics.bot_error(codes::STOP_BOT, &err, &bot.id);
            }
        }
        Ok(())
    }

    /// Tear down engine artifacts not backed by any known bot.
    ///
    /// Reclaims containers left behind by crashes, prior process
    /// incarnations, or de-assignments that failed mid-teardown.
    pub async fn cleanup_unused_bots(&self) -> Result<(), LifecycleError> {
        let containers = self
            .containers
            .load_bot_containers()
            .await
            .map_err(LifecycleError::LoadBotContainers)?;
        let known: HashSet<String> =
            self.running_bots.iter().map(|bot| bot.container_name()).collect();

        for record in containers {
            let name = record.name();
            if known.contains(name) {
                continue;
            }
            info!(container = name, container_id = %record.id, "removing unused bot container");
            if let Err(err) = self.containers.tear_down_bot(name, true).await {
                warn!(container = name, error = %err, "failed to remove unused bot container");
            }
        }
        Ok(())
    }

    /// Shut down all running bots on process exit.
    ///
    /// Payloads are kept (`remove_payload = false`) so data volumes survive
    /// a process restart; the running set is rediscovered from the engine.
    pub async fn tear_down_running_bots(&mut self) {
        let bots = std::mem::take(&mut self.running_bots);
        info!(count = bots.len(), "tearing down running bots");
        self.pool.remove_bots_with_configs(&bots).await;
        for bot in &bots {
            self.tear_down_bot(bot, false).await;
        }
    }

    /// Tear down one bot's container within the remove timeout, absorbing
    /// failures as bot errors.
    async fn tear_down_bot(&self, bot: &BotConfig, remove_payload: bool) {
        let name = bot.container_name();
        let teardown = self.containers.tear_down_bot(&name, remove_payload);
        match tokio::time::timeout(self.bot_remove_timeout, teardown).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(bot_id = %bot.id, container = %name, error = %err, "failed to tear down bot");
                self.metrics.bot_error(codes::TEARDOWN_BOT, &err, &bot.id);
            }
            Err(elapsed) => {
                warn!(bot_id = %bot.id, container = %name, "bot teardown timed out");
                self.metrics.bot_error(codes::TEARDOWN_BOT, &elapsed, &bot.id);
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
