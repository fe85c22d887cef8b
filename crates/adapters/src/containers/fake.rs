// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{BotClient, ContainerError};
use async_trait::async_trait;
use hive_core::test_support::CallJournal;
use hive_core::{bot_ids, BotConfig, ContainerRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded container client call
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerCall {
    EnsureImages(Vec<BotConfig>),
    Launch(BotConfig),
    Stop(BotConfig),
    TearDown { name: String, remove_payload: bool },
    LoadContainers,
    StartWait(String),
}

#[derive(Default)]
struct FakeBotClientState {
    calls: Vec<ContainerCall>,
    containers: Vec<ContainerRecord>,
    image_failures: HashMap<String, String>,
    launch_failures: HashMap<String, String>,
    stop_failures: HashMap<String, String>,
    teardown_failures: HashMap<String, String>,
    start_failures: HashMap<String, String>,
    load_failure: Option<String>,
}

/// Fake container client for testing.
///
/// Records every call, serves a scripted container list, and fails
/// individual operations per bot id / container name / container id.
/// Optionally appends to a shared [`CallJournal`] for cross-collaborator
/// ordering assertions.
#[derive(Clone, Default)]
pub struct FakeBotClient {
    inner: Arc<Mutex<FakeBotClientState>>,
    journal: Option<CallJournal>,
}

impl FakeBotClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Fail image pulls for a bot id.
    pub fn fail_image(&self, bot_id: &str, message: &str) {
        self.inner.lock().image_failures.insert(bot_id.to_string(), message.to_string());
    }

    /// Stop failing image pulls for a bot id.
    pub fn clear_image_failure(&self, bot_id: &str) {
        self.inner.lock().image_failures.remove(bot_id);
    }

    /// Fail launches for a bot id.
    pub fn fail_launch(&self, bot_id: &str, message: &str) {
        self.inner.lock().launch_failures.insert(bot_id.to_string(), message.to_string());
    }

    /// Fail stops for a bot id.
    pub fn fail_stop(&self, bot_id: &str, message: &str) {
        self.inner.lock().stop_failures.insert(bot_id.to_string(), message.to_string());
    }

    /// Fail teardowns for a container name.
    pub fn fail_teardown(&self, container_name: &str, message: &str) {
        self.inner.lock().teardown_failures.insert(container_name.to_string(), message.to_string());
    }

    /// Fail starts for a container id.
    pub fn fail_start(&self, container_id: &str, message: &str) {
        self.inner.lock().start_failures.insert(container_id.to_string(), message.to_string());
    }

    /// Fail container listing.
    pub fn fail_load(&self, message: &str) {
        self.inner.lock().load_failure = Some(message.to_string());
    }

    /// Script the container listing.
    pub fn set_containers(&self, containers: Vec<ContainerRecord>) {
        self.inner.lock().containers = containers;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ContainerCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    fn record(&self, call: ContainerCall, journal_entry: String) {
        self.inner.lock().calls.push(call);
        if let Some(journal) = &self.journal {
            journal.record(journal_entry);
        }
    }
}

#[async_trait]
impl BotClient for FakeBotClient {
    async fn ensure_bot_images(&self, bots: &[BotConfig]) -> Vec<Result<(), ContainerError>> {
        self.record(
            ContainerCall::EnsureImages(bots.to_vec()),
            format!("containers.ensure_images:{}", bot_ids(bots).join(",")),
        );
        let state = self.inner.lock();
        bots.iter()
            .map(|bot| match state.image_failures.get(&bot.id) {
                Some(message) => Err(ContainerError::ImageUnavailable(message.clone())),
                None => Ok(()),
            })
            .collect()
    }

    async fn launch_bot(&self, bot: &BotConfig) -> Result<(), ContainerError> {
        self.record(
            ContainerCall::Launch(bot.clone()),
            format!("containers.launch:{}", bot.id),
        );
        match self.inner.lock().launch_failures.get(&bot.id) {
            Some(message) => Err(ContainerError::CommandFailed(message.clone())),
            None => Ok(()),
        }
    }

    async fn stop_bot(&self, bot: &BotConfig) -> Result<(), ContainerError> {
        self.record(
            ContainerCall::Stop(bot.clone()),
            format!("containers.stop:{}", bot.id),
        );
        match self.inner.lock().stop_failures.get(&bot.id) {
            Some(message) => Err(ContainerError::CommandFailed(message.clone())),
            None => Ok(()),
        }
    }

    async fn tear_down_bot(
        &self,
        container_name: &str,
        remove_payload: bool,
    ) -> Result<(), ContainerError> {
        self.record(
            ContainerCall::TearDown {
                name: container_name.to_string(),
                remove_payload,
            },
            format!("containers.teardown:{}", container_name),
        );
        match self.inner.lock().teardown_failures.get(container_name) {
            Some(message) => Err(ContainerError::CommandFailed(message.clone())),
            None => Ok(()),
        }
    }

    async fn load_bot_containers(&self) -> Result<Vec<ContainerRecord>, ContainerError> {
        self.record(ContainerCall::LoadContainers, "containers.load".to_string());
        let state = self.inner.lock();
        match &state.load_failure {
            Some(message) => Err(ContainerError::CommandFailed(message.clone())),
            None => Ok(state.containers.clone()),
        }
    }

    async fn start_wait_bot_container(&self, container_id: &str) -> Result<(), ContainerError> {
        self.record(
            ContainerCall::StartWait(container_id.to_string()),
            format!("containers.start_wait:{}", container_id),
        );
        match self.inner.lock().start_failures.get(container_id) {
            Some(message) => Err(ContainerError::CommandFailed(message.clone())),
            None => Ok(()),
        }
    }
}
