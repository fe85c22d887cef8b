// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot assignment model.
//!
//! A [`BotConfig`] describes one assigned detection bot: the registry-assigned
//! identifier, the container image to run, and an optional shard slot. Two
//! shards of the same bot ID are independent bots realized as distinct
//! containers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every bot container name the manager creates.
pub const CONTAINER_NAME_PREFIX: &str = "hive-bot";

/// Shard slot of a sharded bot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Zero-based shard index.
    pub shard_id: u32,
    /// Total number of shards (positive).
    pub shards: u32,
}

/// Identity and deployment parameters of a single assigned bot.
///
/// Equality is full-field: a changed image or shard slot under the same ID
/// is a different bot from the diff engine's point of view (remove of the
/// old config plus add of the new one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotConfig {
    /// Globally unique assignment identifier from the registry.
    pub id: String,
    /// Container image reference. Opaque to the manager.
    pub image: String,
    /// Shard slot; absent means a single-shard assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_config: Option<ShardConfig>,
}

impl BotConfig {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self { id: id.into(), image: image.into(), shard_config: None }
    }

    pub fn with_shard(mut self, shard_id: u32, shards: u32) -> Self {
        self.shard_config = Some(ShardConfig { shard_id, shards });
        self
    }

    /// Shard slot of this assignment. Absent shard config is shard 0.
    pub fn shard_id(&self) -> u32 {
        self.shard_config.as_ref().map_or(0, |s| s.shard_id)
    }

    /// Stable container name derived from `(id, shard_id)`.
    ///
    /// Safe for the engine's name field and for filesystem paths. Engines
    /// prepend `/` when listing; compare against
    /// [`crate::ContainerRecord::name`], which strips it.
    pub fn container_name(&self) -> String {
        format!("{}-{}-{}", CONTAINER_NAME_PREFIX, sanitize(&self.id), self.shard_id())
    }
}

impl fmt::Display for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (shard {})", self.id, self.shard_id())
    }
}

/// Map any character the engine or a filesystem could reject to `-`.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '-' })
        .collect()
}

/// Project the bot IDs out of a config list, preserving order.
pub fn bot_ids(bots: &[BotConfig]) -> Vec<String> {
    bots.iter().map(|b| b.id.clone()).collect()
}

#[cfg(test)]
#[path = "bot_tests.rs"]
mod tests;
