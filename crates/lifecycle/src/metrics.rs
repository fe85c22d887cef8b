// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle observability sink.
//!
//! The manager reports what it intends (`status_*`), what it did
//! (`action_*`), and what failed (`*_error`). Per-bot failures carry a
//! classifying code so downstream dashboards can aggregate by failure kind.

use hive_core::BotConfig;
use std::fmt;

/// Error codes attached to lifecycle system and bot errors.
pub mod codes {
    pub const LOAD_ASSIGNED_BOTS: &str = "load.assigned.bots";
    pub const PULL_IMAGE: &str = "pull.image";
    pub const LAUNCH_BOT: &str = "launch.bot";
    pub const TEARDOWN_BOT: &str = "teardown.bot";
    pub const START_EXITED_BOT_CONTAINER: &str = "start.exited.bot.container";
    pub const STOP_BOT: &str = "stop.bot";
}

/// Sink for lifecycle status and error events.
pub trait Lifecycle: Send + Sync + 'static {
    /// The set of bots the manager intends to be running after a pass.
    fn status_running(&self, bots: &[BotConfig]);

    /// Bots about to be torn down.
    fn status_stopping(&self, bots: &[BotConfig]);

    /// A restart of an exited bot container.
    fn action_restart(&self, bot: &BotConfig);

    /// A failure not attributable to a single bot.
    fn system_error(&self, code: &str, err: &dyn fmt::Display);

    /// A per-bot failure.
    fn bot_error(&self, code: &str, err: &dyn fmt::Display, bot_id: &str);
}

/// Production sink that emits structured tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLifecycle;

impl Lifecycle for TracingLifecycle {
    fn status_running(&self, bots: &[BotConfig]) {
        tracing::info!(count = bots.len(), "bots running");
    }

    fn status_stopping(&self, bots: &[BotConfig]) {
        tracing::info!(count = bots.len(), "bots stopping");
    }

    fn action_restart(&self, bot: &BotConfig) {
        tracing::info!(bot_id = %bot.id, container = %bot.container_name(), "restarting bot");
    }

    fn system_error(&self, code: &str, err: &dyn fmt::Display) {
        tracing::error!(code, error = %err, "lifecycle system error");
    }

    fn bot_error(&self, code: &str, err: &dyn fmt::Display, bot_id: &str) {
        tracing::warn!(code, bot_id, error = %err, "lifecycle bot error");
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Lifecycle;
    use hive_core::BotConfig;
    use parking_lot::Mutex;
    use std::fmt;
    use std::sync::Arc;

    /// Recorded metrics call
    #[derive(Debug, Clone, PartialEq)]
    pub enum MetricsCall {
        StatusRunning(Vec<BotConfig>),
        StatusStopping(Vec<BotConfig>),
        ActionRestart(BotConfig),
        SystemError { code: String, error: String },
        BotError { code: String, error: String, bot_id: String },
    }

    /// Fake metrics sink for testing
    #[derive(Clone, Default)]
    pub struct FakeLifecycle {
        calls: Arc<Mutex<Vec<MetricsCall>>>,
    }

    impl FakeLifecycle {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<MetricsCall> {
            self.calls.lock().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().clear();
        }
    }

    impl Lifecycle for FakeLifecycle {
        fn status_running(&self, bots: &[BotConfig]) {
            self.calls.lock().push(MetricsCall::StatusRunning(bots.to_vec()));
        }

        fn status_stopping(&self, bots: &[BotConfig]) {
            self.calls.lock().push(MetricsCall::StatusStopping(bots.to_vec()));
        }

        fn action_restart(&self, bot: &BotConfig) {
            self.calls.lock().push(MetricsCall::ActionRestart(bot.clone()));
        }

        fn system_error(&self, code: &str, err: &dyn fmt::Display) {
            self.calls.lock().push(MetricsCall::SystemError {
                code: code.to_string(),
                error: err.to_string(),
            });
        }

        fn bot_error(&self, code: &str, err: &dyn fmt::Display, bot_id: &str) {
            self.calls.lock().push(MetricsCall::BotError {
                code: code.to_string(),
                error: err.to_string(),
                bot_id: bot_id.to_string(),
            });
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLifecycle, MetricsCall};
