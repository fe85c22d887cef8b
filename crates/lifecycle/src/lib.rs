// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-lifecycle: the control-plane core of the hive node.
//!
//! The [`BotLifecycleManager`] reconciles the set of assigned bots (from the
//! registry) against the set of running bot containers, and coordinates with
//! the connection pool and the liveness monitor. The [`Driver`] runs its
//! periodic operations on timers, serialized onto a single task.

pub mod config;
pub mod driver;
pub mod manager;
pub mod metrics;
pub mod monitor;
pub mod pool;

pub use config::LifecycleConfig;
pub use driver::Driver;
pub use manager::{BotLifecycleManager, LifecycleError};
pub use metrics::{codes, Lifecycle, TracingLifecycle};
pub use monitor::{ActivityBotMonitor, BotMonitor};
pub use pool::BotPoolUpdater;

#[cfg(any(test, feature = "test-support"))]
pub use metrics::{FakeLifecycle, MetricsCall};
#[cfg(any(test, feature = "test-support"))]
pub use monitor::FakeBotMonitor;
#[cfg(any(test, feature = "test-support"))]
pub use pool::{FakeBotPool, PoolCall};
