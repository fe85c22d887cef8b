// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container engine adapters for bot containers.
//!
//! The [`BotClient`] trait is the manager's entire view of the container
//! engine. The production implementation drives the Docker CLI; tests use
//! the recording [`FakeBotClient`].

mod docker;

pub use docker::{DockerBotClient, DockerOptions};

use async_trait::async_trait;
use hive_core::{BotConfig, ContainerRecord};
use thiserror::Error;

/// Errors from container engine operations
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("{0}")]
    CommandFailed(String),

    #[error("container {0} did not reach running state")]
    StartTimeout(String),

    #[error("failed to decode engine output: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to exec container engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for managing bot containers
#[async_trait]
pub trait BotClient: Send + Sync + 'static {
    /// Make sure the image of every given bot exists locally.
    ///
    /// Pulls fan out concurrently; the result slice is aligned with the
    /// input, one slot per bot. An error slot means the image is unavailable
    /// and the bot must not be launched this cycle. Already-present images
    /// succeed cheaply.
    async fn ensure_bot_images(&self, bots: &[BotConfig]) -> Vec<Result<(), ContainerError>>;

    /// Create and start the container for a bot.
    ///
    /// The caller guarantees the bot is not already running; launching a
    /// running bot is an error.
    async fn launch_bot(&self, bot: &BotConfig) -> Result<(), ContainerError>;

    /// Stop a bot's container gracefully (signal, then kill after grace).
    ///
    /// Artifacts stay on disk so a later reconcile or restart sweep can
    /// observe the exited container.
    async fn stop_bot(&self, bot: &BotConfig) -> Result<(), ContainerError>;

    /// Stop and remove a container by name.
    ///
    /// With `remove_payload` the bot's data volume is removed as well;
    /// without it, data survives for the next process incarnation.
    async fn tear_down_bot(
        &self,
        container_name: &str,
        remove_payload: bool,
    ) -> Result<(), ContainerError>;

    /// All containers the engine labels as bot containers, in any state.
    async fn load_bot_containers(&self) -> Result<Vec<ContainerRecord>, ContainerError>;

    /// Start an existing container by engine ID and wait until it runs.
    async fn start_wait_bot_container(&self, container_id: &str) -> Result<(), ContainerError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ContainerCall, FakeBotClient};
