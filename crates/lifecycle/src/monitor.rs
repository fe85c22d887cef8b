// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot liveness monitoring.
//!
//! The monitor watches per-bot activity samples and flags bots that have
//! gone silent. It never acts on its own: the inactivity reaper asks it for
//! the current inactive set and stops those containers.

use hive_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Judge of per-bot liveness based on observed activity.
pub trait BotMonitor: Send + Sync + 'static {
    /// Replace the set of watched bot IDs.
    fn monitor_bots(&self, ids: Vec<String>);

    /// Watched bot IDs with no recorded activity within the threshold.
    fn get_inactive_bots(&self) -> Vec<String>;
}

#[derive(Default)]
struct WatchState {
    watched: Vec<String>,
    last_seen_ms: HashMap<String, u64>,
}

/// Monitor that judges inactivity from last-activity timestamps.
///
/// Activity samples arrive through [`record_activity`] — typically wired to
/// the node's per-bot metrics ingest. A bot is inactive once its last sample
/// is older than the threshold. Newly watched bots are seeded with the
/// current time so they get a full window before they can be flagged, and
/// reporting a bot inactive re-arms its window: the reaper stops it, the
/// restart sweeper revives it, and the revived container gets one full
/// threshold window to produce samples before it can be flagged again.
///
/// [`record_activity`]: ActivityBotMonitor::record_activity
pub struct ActivityBotMonitor<C: Clock> {
    clock: C,
    threshold: Duration,
    inner: Mutex<WatchState>,
}

impl<C: Clock> ActivityBotMonitor<C> {
    pub fn new(clock: C, threshold: Duration) -> Self {
        Self { clock, threshold, inner: Mutex::new(WatchState::default()) }
    }

    /// Record an activity sample for a bot. Samples for unwatched bots are
    /// dropped.
    pub fn record_activity(&self, bot_id: &str) {
        let now = self.clock.epoch_ms();
        let mut state = self.inner.lock();
        if state.watched.iter().any(|w| w == bot_id) {
            state.last_seen_ms.insert(bot_id.to_string(), now);
        }
    }
}

impl<C: Clock> BotMonitor for ActivityBotMonitor<C> {
    fn monitor_bots(&self, ids: Vec<String>) {
        let now = self.clock.epoch_ms();
        let mut state = self.inner.lock();
        state.last_seen_ms.retain(|id, _| ids.contains(id));
        for id in &ids {
            state.last_seen_ms.entry(id.clone()).or_insert(now);
        }
        state.watched = ids;
    }

    fn get_inactive_bots(&self) -> Vec<String> {
        let now = self.clock.epoch_ms();
        let threshold_ms = self.threshold.as_millis() as u64;
        let mut state = self.inner.lock();
        let inactive: Vec<String> = state
            .watched
            .iter()
            .filter(|id| {
                state
                    .last_seen_ms
                    .get(*id)
                    .is_some_and(|seen| now.saturating_sub(*seen) > threshold_ms)
            })
            .cloned()
            .collect();
        // Re-arm reported bots so the restarted container gets a full
        // window before it can be flagged again.
        for id in &inactive {
            state.last_seen_ms.insert(id.clone(), now);
        }
        inactive
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::BotMonitor;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeMonitorState {
        watched_sets: Vec<Vec<String>>,
        inactive: Vec<String>,
    }

    /// Fake monitor with a scripted inactive set
    #[derive(Clone, Default)]
    pub struct FakeBotMonitor {
        inner: Arc<Mutex<FakeMonitorState>>,
    }

    impl FakeBotMonitor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the inactive set returned by `get_inactive_bots`.
        pub fn set_inactive(&self, ids: Vec<String>) {
            self.inner.lock().inactive = ids;
        }

        /// Every watched set passed to `monitor_bots`, in call order.
        pub fn watched_sets(&self) -> Vec<Vec<String>> {
            self.inner.lock().watched_sets.clone()
        }

        pub fn clear_calls(&self) {
            self.inner.lock().watched_sets.clear();
        }
    }

    impl BotMonitor for FakeBotMonitor {
        fn monitor_bots(&self, ids: Vec<String>) {
            self.inner.lock().watched_sets.push(ids);
        }

        fn get_inactive_bots(&self) -> Vec<String> {
            self.inner.lock().inactive.clone()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBotMonitor;

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
