// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot pool updater seam.
//!
//! The pool holds live bidirectional RPC channels to running bots. The
//! manager only feeds it configuration deltas; channel management, ordering
//! and priority state live with the pool. Removal is announced *before* the
//! underlying container is torn down so the pool can drain traffic.

use async_trait::async_trait;
use hive_core::BotConfig;

/// Consumer of bot configuration deltas from the lifecycle manager.
#[async_trait]
pub trait BotPoolUpdater: Send + Sync + 'static {
    /// Reset the pool to exactly these bots.
    async fn update_bots_with_latest_configs(&self, bots: &[BotConfig]);

    /// Remove these bots, draining their channels.
    async fn remove_bots_with_configs(&self, bots: &[BotConfig]);

    /// Re-establish channels to restarted bots.
    ///
    /// A restarted container is the same bot identity: the stale channel's
    /// slot is reused rather than re-added, preserving whatever ordering or
    /// priority state the pool holds for it.
    async fn reconnect_to_bots_with_configs(&self, bots: &[BotConfig]);
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::BotPoolUpdater;
    use async_trait::async_trait;
    use hive_core::test_support::CallJournal;
    use hive_core::{bot_ids, BotConfig};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded pool call
    #[derive(Debug, Clone, PartialEq)]
    pub enum PoolCall {
        Update(Vec<BotConfig>),
        Remove(Vec<BotConfig>),
        Reconnect(Vec<BotConfig>),
    }

    /// Fake pool updater for testing
    #[derive(Clone, Default)]
    pub struct FakeBotPool {
        calls: Arc<Mutex<Vec<PoolCall>>>,
        journal: Option<CallJournal>,
    }

    impl FakeBotPool {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_journal(mut self, journal: CallJournal) -> Self {
            self.journal = Some(journal);
            self
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<PoolCall> {
            self.calls.lock().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().clear();
        }

        fn record(&self, call: PoolCall, journal_entry: String) {
            self.calls.lock().push(call);
            if let Some(journal) = &self.journal {
                journal.record(journal_entry);
            }
        }
    }

    #[async_trait]
    impl BotPoolUpdater for FakeBotPool {
        async fn update_bots_with_latest_configs(&self, bots: &[BotConfig]) {
            self.record(
                PoolCall::Update(bots.to_vec()),
                format!("pool.update:{}", bot_ids(bots).join(",")),
            );
        }

        async fn remove_bots_with_configs(&self, bots: &[BotConfig]) {
            self.record(
                PoolCall::Remove(bots.to_vec()),
                format!("pool.remove:{}", bot_ids(bots).join(",")),
            );
        }

        async fn reconnect_to_bots_with_configs(&self, bots: &[BotConfig]) {
            self.record(
                PoolCall::Reconnect(bots.to_vec()),
                format!("pool.reconnect:{}", bot_ids(bots).join(",")),
            );
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBotPool, PoolCall};
