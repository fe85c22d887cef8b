// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker implementation of the bot container client.
//!
//! Drives the Docker CLI rather than the engine API: the node already
//! requires the CLI for operator tooling, and shelling out keeps the
//! dependency surface small. Every resource created here carries the
//! `hive=true` label so listing and cleanup only ever see our containers.
//!
//! Each bot gets a per-bot data volume named `{container_name}-data`,
//! mounted at `/data`. Teardown removes it only when asked to
//! (`remove_payload`), so bot state survives graceful node restarts.

use super::{BotClient, ContainerError};
use async_trait::async_trait;
use futures_util::future::join_all;
use hive_core::{BotConfig, ContainerRecord};
use serde::Deserialize;
use std::time::Duration;

/// Label attached to every container and volume the client creates.
const RESOURCE_LABEL: &str = "hive";

/// Options for the Docker bot client.
#[derive(Debug, Clone)]
pub struct DockerOptions {
    /// Grace period passed to `docker stop` before the engine kills.
    pub stop_grace: Duration,
    /// json-file log rotation: maximum size per file (e.g. `10m`).
    pub max_log_size: String,
    /// json-file log rotation: maximum number of files.
    pub max_log_files: u32,
    /// Poll cadence while waiting for a started container.
    pub ready_poll: Duration,
    /// Maximum readiness polls before giving up.
    pub ready_attempts: u32,
}

impl Default for DockerOptions {
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_secs(10),
            max_log_size: "10m".to_string(),
            max_log_files: 10,
            ready_poll: Duration::from_millis(100),
            ready_attempts: 150,
        }
    }
}

/// Bot container client backed by the Docker CLI.
#[derive(Debug, Clone, Default)]
pub struct DockerBotClient {
    opts: DockerOptions,
}

impl DockerBotClient {
    pub fn new(opts: DockerOptions) -> Self {
        Self { opts }
    }

    async fn pull_image(&self, bot: &BotConfig) -> Result<(), ContainerError> {
        // Present images succeed without touching the network.
        if run_docker(&["image", "inspect", &bot.image]).await.is_ok() {
            return Ok(());
        }
        tracing::info!(bot_id = %bot.id, image = %bot.image, "pulling bot image");
        run_docker(&["pull", &bot.image])
            .await
            .map(|_| ())
            .map_err(|e| ContainerError::ImageUnavailable(format!("{}: {}", bot.image, e)))
    }

    async fn is_running(&self, container_id: &str) -> bool {
        matches!(
            run_docker(&["inspect", "-f", "{{.State.Running}}", container_id]).await,
            Ok(out) if out == "true"
        )
    }
}

#[async_trait]
impl BotClient for DockerBotClient {
    async fn ensure_bot_images(&self, bots: &[BotConfig]) -> Vec<Result<(), ContainerError>> {
        join_all(bots.iter().map(|bot| self.pull_image(bot))).await
    }

    async fn launch_bot(&self, bot: &BotConfig) -> Result<(), ContainerError> {
        let name = bot.container_name();
        let volume = volume_name(&name);
        let label = format!("{}=true", RESOURCE_LABEL);

        run_docker(&["volume", "create", "--label", &label, &volume]).await?;

        let args = launch_args(bot, &self.opts);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(bot_id = %bot.id, container = %name, image = %bot.image, "launching bot container");
        run_docker(&arg_refs).await.map(|_| ())
    }

    async fn stop_bot(&self, bot: &BotConfig) -> Result<(), ContainerError> {
        let name = bot.container_name();
        let grace = self.opts.stop_grace.as_secs().to_string();
        tracing::info!(bot_id = %bot.id, container = %name, "stopping bot container");
        run_docker(&["stop", "-t", &grace, &name]).await.map(|_| ())
    }

    async fn tear_down_bot(
        &self,
        container_name: &str,
        remove_payload: bool,
    ) -> Result<(), ContainerError> {
        tracing::info!(container = container_name, remove_payload, "tearing down bot container");
        run_docker(&["rm", "-f", container_name]).await?;
        if remove_payload {
            // The volume may never have been created; removal is best-effort.
            let _ = run_docker(&["volume", "rm", &volume_name(container_name)]).await;
        }
        Ok(())
    }

    async fn load_bot_containers(&self) -> Result<Vec<ContainerRecord>, ContainerError> {
        let filter = format!("label={}", RESOURCE_LABEL);
        let out =
            run_docker(&["ps", "-a", "--filter", &filter, "--format", "{{json .}}"]).await?;
        parse_ps_output(&out)
    }

    async fn start_wait_bot_container(&self, container_id: &str) -> Result<(), ContainerError> {
        run_docker(&["start", container_id]).await?;
        for attempt in 0..self.opts.ready_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.opts.ready_poll).await;
            }
            if self.is_running(container_id).await {
                tracing::info!(container_id, attempt, "bot container running");
                return Ok(());
            }
        }
        Err(ContainerError::StartTimeout(container_id.to_string()))
    }
}

/// Name of the data volume paired with a bot container.
fn volume_name(container_name: &str) -> String {
    format!("{}-data", container_name)
}

/// Build the full `docker run` argument list for a bot.
fn launch_args(bot: &BotConfig, opts: &DockerOptions) -> Vec<String> {
    let name = bot.container_name();
    let mut args: Vec<String> = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        name.clone(),
        "--label".into(),
        format!("{}=true", RESOURCE_LABEL),
        "--log-driver".into(),
        "json-file".into(),
        "--log-opt".into(),
        format!("max-size={}", opts.max_log_size),
        "--log-opt".into(),
        format!("max-file={}", opts.max_log_files),
        "-e".into(),
        format!("HIVE_BOT_ID={}", bot.id),
        "-e".into(),
        format!("HIVE_SHARD_ID={}", bot.shard_id()),
        "-v".into(),
        format!("{}:/data", volume_name(&name)),
    ];
    if let Some(shard) = &bot.shard_config {
        args.push("-e".into());
        args.push(format!("HIVE_SHARDS={}", shard.shards));
    }
    args.push(bot.image.clone());
    args
}

/// One line of `docker ps --format '{{json .}}'` output.
#[derive(Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "State")]
    state: String,
}

/// Decode `docker ps` JSON-lines output into container records.
fn parse_ps_output(out: &str) -> Result<Vec<ContainerRecord>, ContainerError> {
    out.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let row: PsRow = serde_json::from_str(line).map_err(ContainerError::Decode)?;
            Ok(ContainerRecord {
                id: row.id,
                names: row.names.split(',').map(str::to_string).collect(),
                state: row.state,
            })
        })
        .collect()
}

/// Run a docker CLI command and return stdout on success.
async fn run_docker(args: &[&str]) -> Result<String, ContainerError> {
    let output = tokio::process::Command::new("docker").args(args).output().await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ContainerError::CommandFailed(format!(
            "docker {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        )))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
