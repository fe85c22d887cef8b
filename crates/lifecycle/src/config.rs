// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle configuration.

use hive_adapters::DockerOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the lifecycle manager and its driver.
///
/// Durations deserialize from humantime strings (`"30s"`, `"5m"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Cadence of full reconcile passes.
    #[serde(default = "default_reconcile_interval")]
    #[serde(with = "humantime_serde")]
    pub reconcile_interval: Duration,

    /// Cadence of the exited-container restart sweep. Faster than
    /// reconcile, so a crashed bot comes back before the next full pass.
    #[serde(default = "default_restart_interval")]
    #[serde(with = "humantime_serde")]
    pub restart_interval: Duration,

    /// Cadence of inactivity reaping.
    #[serde(default = "default_inactivity_interval")]
    #[serde(with = "humantime_serde")]
    pub inactivity_interval: Duration,

    /// Cadence of stray-container cleanup.
    #[serde(default = "default_cleanup_interval")]
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,

    /// Per-bot budget for container teardown.
    #[serde(default = "default_bot_remove_timeout")]
    #[serde(with = "humantime_serde")]
    pub bot_remove_timeout: Duration,

    /// Silence window after which a watched bot counts as inactive.
    #[serde(default = "default_inactivity_threshold")]
    #[serde(with = "humantime_serde")]
    pub inactivity_threshold: Duration,

    /// Grace period a stopped bot gets before the engine kills it.
    #[serde(default = "default_stop_grace")]
    #[serde(with = "humantime_serde")]
    pub stop_grace: Duration,

    /// Bot container log rotation: maximum size per file (engine syntax,
    /// e.g. `10m`).
    #[serde(default = "default_max_log_size")]
    pub max_log_size: String,

    /// Bot container log rotation: maximum number of files.
    #[serde(default = "default_max_log_files")]
    pub max_log_files: u32,
}

impl LifecycleConfig {
    /// Container client options derived from this config.
    pub fn docker_options(&self) -> DockerOptions {
        DockerOptions {
            stop_grace: self.stop_grace,
            max_log_size: self.max_log_size.clone(),
            max_log_files: self.max_log_files,
            ..DockerOptions::default()
        }
    }
}

const fn default_reconcile_interval() -> Duration {
    Duration::from_secs(60)
}

const fn default_restart_interval() -> Duration {
    Duration::from_secs(15)
}

const fn default_inactivity_interval() -> Duration {
    Duration::from_secs(60)
}

const fn default_cleanup_interval() -> Duration {
    Duration::from_secs(300)
}

const fn default_bot_remove_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_inactivity_threshold() -> Duration {
    Duration::from_secs(300)
}

const fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_max_log_size() -> String {
    "10m".to_string()
}

const fn default_max_log_files() -> u32 {
    10
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: default_reconcile_interval(),
            restart_interval: default_restart_interval(),
            inactivity_interval: default_inactivity_interval(),
            cleanup_interval: default_cleanup_interval(),
            bot_remove_timeout: default_bot_remove_timeout(),
            inactivity_threshold: default_inactivity_threshold(),
            stop_grace: default_stop_grace(),
            max_log_size: default_max_log_size(),
            max_log_files: default_max_log_files(),
        }
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
