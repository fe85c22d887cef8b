// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot assignment registry adapter.
//!
//! The registry is the external authority on which bots should run on this
//! node. The manager only ever asks for a snapshot; assignment decisions are
//! made elsewhere.

use async_trait::async_trait;
use hive_core::BotConfig;
use thiserror::Error;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("assignment request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0} from assignment endpoint")]
    Status(reqwest::StatusCode),

    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Source of the node's current bot assignments.
#[async_trait]
pub trait BotRegistry: Send + Sync + 'static {
    /// Snapshot of the bots currently assigned to this node.
    async fn load_assigned_bots(&self) -> Result<Vec<BotConfig>, RegistryError>;
}

/// Registry client that fetches the assignment list from an HTTP gateway.
///
/// The gateway serves a JSON array of bot configs per node at
/// `{base_url}/assignments/{node_id}`.
pub struct HttpBotRegistry {
    base_url: String,
    node_id: String,
    client: reqwest::Client,
}

impl HttpBotRegistry {
    pub fn new(base_url: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            node_id: node_id.into(),
            client: reqwest::Client::new(),
        }
    }

    fn assignments_url(&self) -> String {
        format!("{}/assignments/{}", self.base_url, self.node_id)
    }
}

#[async_trait]
impl BotRegistry for HttpBotRegistry {
    async fn load_assigned_bots(&self) -> Result<Vec<BotConfig>, RegistryError> {
        let response = self.client.get(self.assignments_url()).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::Status(response.status()));
        }
        let bots: Vec<BotConfig> = response.json().await?;
        tracing::debug!(count = bots.len(), "loaded assigned bots");
        Ok(bots)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{BotRegistry, RegistryError};
    use async_trait::async_trait;
    use hive_core::BotConfig;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct FakeRegistryState {
        assignments: Vec<BotConfig>,
        fail_next: Option<String>,
        loads: usize,
    }

    /// Fake registry serving a scripted assignment snapshot.
    ///
    /// The snapshot is sticky: every load returns the last value passed to
    /// `set_assignments`, except when a one-shot failure is queued.
    #[derive(Clone)]
    pub struct FakeBotRegistry {
        inner: Arc<Mutex<FakeRegistryState>>,
    }

    impl Default for FakeBotRegistry {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeRegistryState {
                    assignments: Vec::new(),
                    fail_next: None,
                    loads: 0,
                })),
            }
        }
    }

    impl FakeBotRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_assignments(&self, bots: Vec<BotConfig>) {
            self.inner.lock().assignments = bots;
        }

        /// Fail the next load with `RegistryError::Unavailable`.
        pub fn fail_next(&self, message: &str) {
            self.inner.lock().fail_next = Some(message.to_string());
        }

        /// Number of loads served so far.
        pub fn loads(&self) -> usize {
            self.inner.lock().loads
        }
    }

    #[async_trait]
    impl BotRegistry for FakeBotRegistry {
        async fn load_assigned_bots(&self) -> Result<Vec<BotConfig>, RegistryError> {
            let mut state = self.inner.lock();
            state.loads += 1;
            match state.fail_next.take() {
                Some(message) => Err(RegistryError::Unavailable(message)),
                None => Ok(state.assignments.clone()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBotRegistry;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
