// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::metrics::{FakeLifecycle, MetricsCall};
use crate::monitor::FakeBotMonitor;
use crate::pool::{FakeBotPool, PoolCall};
use hive_adapters::{ContainerCall, FakeBotClient, FakeBotRegistry};
use hive_core::test_support::CallJournal;

type TestManager =
    BotLifecycleManager<FakeBotRegistry, FakeBotClient, FakeBotPool, FakeBotMonitor, FakeLifecycle>;

struct TestContext {
    manager: TestManager,
    registry: FakeBotRegistry,
    containers: FakeBotClient,
    pool: FakeBotPool,
    monitor: FakeBotMonitor,
    metrics: FakeLifecycle,
    journal: CallJournal,
}

fn setup() -> TestContext {
    let journal = CallJournal::new();
    let registry = FakeBotRegistry::new();
    let containers = FakeBotClient::new().with_journal(journal.clone());
    let pool = FakeBotPool::new().with_journal(journal.clone());
    let monitor = FakeBotMonitor::new();
    let metrics = FakeLifecycle::new();
    let manager = BotLifecycleManager::new(
        registry.clone(),
        containers.clone(),
        pool.clone(),
        monitor.clone(),
        metrics.clone(),
        Duration::ZERO,
    );
    TestContext { manager, registry, containers, pool, monitor, metrics, journal }
}

fn bot(id: &str) -> BotConfig {
    BotConfig::new(id, "img:v1")
}

fn exited(bot: &BotConfig, container_id: &str) -> ContainerRecord {
    ContainerRecord {
        id: container_id.to_string(),
        // Engines prepend a slash when listing.
        names: vec![format!("/{}", bot.container_name())],
        state: "exited".to_string(),
    }
}

fn running(bot: &BotConfig, container_id: &str) -> ContainerRecord {
    ContainerRecord {
        id: container_id.to_string(),
        names: vec![format!("/{}", bot.container_name())],
        state: "running".to_string(),
    }
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn add_update_remove_converges_on_latest_assignments() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    let b3 = bot("bot3");
    let b1_sharded = bot("bot1").with_shard(1, 2);
    ctx.manager.running_bots = vec![b1.clone(), b2.clone()];

    let latest = vec![b3.clone(), b1_sharded.clone()];
    ctx.registry.set_assignments(latest.clone());

    ctx.manager.manage_bots().await.unwrap();

    // The shard change replaces bot1: the unsharded config leaves with bot2,
    // bot3 and the sharded bot1 arrive and launch.
    let calls = ctx.containers.calls();
    assert_eq!(
        calls[0],
        ContainerCall::EnsureImages(vec![b3.clone(), b1_sharded.clone()])
    );
    assert!(calls.contains(&ContainerCall::Launch(b3.clone())));
    assert!(calls.contains(&ContainerCall::Launch(b1_sharded.clone())));
    assert!(calls.contains(&ContainerCall::TearDown {
        name: b1.container_name(),
        remove_payload: true
    }));
    assert!(calls.contains(&ContainerCall::TearDown {
        name: b2.container_name(),
        remove_payload: true
    }));

    assert_eq!(
        ctx.pool.calls(),
        vec![
            PoolCall::Remove(vec![b1.clone(), b2.clone()]),
            PoolCall::Update(latest.clone()),
        ]
    );
    assert_eq!(
        ctx.metrics.calls(),
        vec![
            MetricsCall::StatusStopping(vec![b1.clone(), b2.clone()]),
            MetricsCall::StatusRunning(latest.clone()),
        ]
    );
    assert_eq!(ctx.monitor.watched_sets(), vec![ids(&["bot3", "bot1"])]);
    assert_eq!(ctx.manager.running_bots(), latest.as_slice());
}

#[tokio::test]
async fn pool_removal_precedes_teardown_precedes_pool_update() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    ctx.manager.running_bots = vec![b1.clone(), b2.clone()];
    ctx.registry.set_assignments(vec![b1.clone()]);

    ctx.manager.manage_bots().await.unwrap();

    // The pool must be able to drain bot2's channel before the container is
    // gone, and must not see an update that omits bot2 until after.
    let remove_pos = ctx.journal.position("pool.remove:bot2").expect("pool removal recorded");
    let teardown_pos = ctx
        .journal
        .position(&format!("containers.teardown:{}", b2.container_name()))
        .expect("teardown recorded");
    let update_pos = ctx.journal.position("pool.update:bot1").expect("pool update recorded");
    assert!(
        remove_pos < teardown_pos && teardown_pos < update_pos,
        "expected remove ({remove_pos}) < teardown ({teardown_pos}) < update ({update_pos}), journal: {:?}",
        ctx.journal.entries()
    );
}

#[tokio::test]
async fn registry_failure_fails_the_pass_and_changes_nothing() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    ctx.manager.running_bots = vec![b1.clone()];
    ctx.registry.fail_next("test err assigned bots");

    let result = ctx.manager.manage_bots().await;

    assert!(matches!(result, Err(LifecycleError::LoadAssignedBots(_))));
    assert_eq!(
        ctx.metrics.calls(),
        vec![MetricsCall::SystemError {
            code: "load.assigned.bots".to_string(),
            error: "registry unavailable: test err assigned bots".to_string(),
        }]
    );
    // No collaborator was touched and the running set is intact.
    assert!(ctx.containers.calls().is_empty());
    assert!(ctx.pool.calls().is_empty());
    assert!(ctx.monitor.watched_sets().is_empty());
    assert_eq!(ctx.manager.running_bots(), &[b1]);
}

#[tokio::test]
async fn missing_image_skips_launch_and_is_retried_next_pass() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    ctx.registry.set_assignments(vec![b1.clone(), b2.clone()]);
    ctx.containers.fail_image("bot1", "no such image");

    ctx.manager.manage_bots().await.unwrap();

    let calls = ctx.containers.calls();
    assert!(!calls.contains(&ContainerCall::Launch(b1.clone())));
    assert!(calls.contains(&ContainerCall::Launch(b2.clone())));
    assert!(ctx.metrics.calls().contains(&MetricsCall::BotError {
        code: "pull.image".to_string(),
        error: "image unavailable: no such image".to_string(),
        bot_id: "bot1".to_string(),
    }));
    assert_eq!(ctx.manager.running_bots(), &[b2.clone()]);

    // The image shows up; the diff re-adds the skipped bot next pass.
    ctx.containers.clear_image_failure("bot1");
    ctx.containers.clear_calls();

    ctx.manager.manage_bots().await.unwrap();

    let calls = ctx.containers.calls();
    assert_eq!(calls[0], ContainerCall::EnsureImages(vec![b1.clone()]));
    assert!(calls.contains(&ContainerCall::Launch(b1.clone())));
    assert_eq!(ctx.manager.running_bots(), &[b1, b2]);
}

#[tokio::test]
async fn launch_failure_does_not_block_later_bots() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    let b3 = bot("bot3");
    ctx.registry.set_assignments(vec![b1.clone(), b2.clone(), b3.clone()]);
    ctx.containers.fail_launch("bot2", "port exhausted");

    ctx.manager.manage_bots().await.unwrap();

    // All three launches were attempted; only the failing bot is excluded.
    let calls = ctx.containers.calls();
    for expected in [&b1, &b2, &b3] {
        assert!(calls.contains(&ContainerCall::Launch((*expected).clone())));
    }
    assert!(ctx.metrics.calls().contains(&MetricsCall::BotError {
        code: "launch.bot".to_string(),
        error: "port exhausted".to_string(),
        bot_id: "bot2".to_string(),
    }));
    assert_eq!(ctx.manager.running_bots(), &[b1, b3]);
}

#[tokio::test]
async fn image_change_replaces_the_bot() {
    let mut ctx = setup();
    let old = bot("bot1");
    let new = BotConfig::new("bot1", "img:v2");
    ctx.manager.running_bots = vec![old.clone()];
    ctx.registry.set_assignments(vec![new.clone()]);

    ctx.manager.manage_bots().await.unwrap();

    let calls = ctx.containers.calls();
    assert_eq!(calls[0], ContainerCall::EnsureImages(vec![new.clone()]));
    assert!(calls.contains(&ContainerCall::Launch(new.clone())));
    assert!(calls.contains(&ContainerCall::TearDown {
        name: old.container_name(),
        remove_payload: true
    }));
    assert_eq!(ctx.manager.running_bots(), &[new]);
}

#[tokio::test]
async fn teardown_failure_is_absorbed() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    ctx.manager.running_bots = vec![b1.clone()];
    ctx.registry.set_assignments(vec![]);
    ctx.containers.fail_teardown(&b1.container_name(), "device busy");

    ctx.manager.manage_bots().await.unwrap();

    assert!(ctx.metrics.calls().contains(&MetricsCall::BotError {
        code: "teardown.bot".to_string(),
        error: "device busy".to_string(),
        bot_id: "bot1".to_string(),
    }));
    // The empty final set is still announced everywhere.
    assert!(ctx.pool.calls().contains(&PoolCall::Update(vec![])));
    assert!(ctx.metrics.calls().contains(&MetricsCall::StatusRunning(vec![])));
    assert_eq!(ctx.monitor.watched_sets(), vec![Vec::<String>::new()]);
    assert!(ctx.manager.running_bots().is_empty());
}

#[tokio::test]
async fn steady_state_pass_only_reports() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    let latest = vec![b1, b2];
    ctx.registry.set_assignments(latest.clone());

    ctx.manager.manage_bots().await.unwrap();
    ctx.containers.clear_calls();
    ctx.pool.clear_calls();
    ctx.metrics.clear_calls();
    ctx.monitor.clear_calls();

    ctx.manager.manage_bots().await.unwrap();

    // Nothing changed: no image pulls, launches or teardowns, just the
    // full-state reports.
    assert!(ctx.containers.calls().is_empty());
    assert_eq!(ctx.pool.calls(), vec![PoolCall::Update(latest.clone())]);
    assert_eq!(ctx.metrics.calls(), vec![MetricsCall::StatusRunning(latest.clone())]);
    assert_eq!(ctx.monitor.watched_sets(), vec![ids(&["bot1", "bot2"])]);
    assert_eq!(ctx.registry.loads(), 2);
    assert_eq!(ctx.manager.running_bots(), latest.as_slice());
}

#[tokio::test]
async fn shards_of_one_bot_are_independent() {
    let mut ctx = setup();
    let shard0 = bot("bot1").with_shard(0, 2);
    let shard1 = bot("bot1").with_shard(1, 2);
    ctx.manager.running_bots = vec![shard0.clone()];
    ctx.registry.set_assignments(vec![shard0.clone(), shard1.clone()]);

    ctx.manager.manage_bots().await.unwrap();

    // Adding the second shard launches it; the first is untouched.
    let calls = ctx.containers.calls();
    assert_eq!(calls[0], ContainerCall::EnsureImages(vec![shard1.clone()]));
    assert!(calls.contains(&ContainerCall::Launch(shard1.clone())));
    assert!(!calls.iter().any(|c| matches!(c, ContainerCall::TearDown { .. })));
    assert!(!ctx.pool.calls().iter().any(|c| matches!(c, PoolCall::Remove(_))));
    assert_eq!(ctx.manager.running_bots(), &[shard0, shard1]);
}

#[tokio::test]
async fn restart_starts_exited_containers_and_reconnects_survivors() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    ctx.manager.running_bots = vec![b1.clone(), b2.clone()];
    ctx.containers.set_containers(vec![exited(&b1, "cid1"), exited(&b2, "cid2")]);
    ctx.containers.fail_start("cid2", "failed to start");

    ctx.manager.restart_exited_bots().await.unwrap();

    assert_eq!(
        ctx.containers.calls(),
        vec![
            ContainerCall::LoadContainers,
            ContainerCall::StartWait("cid1".to_string()),
            ContainerCall::StartWait("cid2".to_string()),
        ]
    );
    assert_eq!(
        ctx.metrics.calls(),
        vec![
            MetricsCall::ActionRestart(b1.clone()),
            MetricsCall::ActionRestart(b2.clone()),
            MetricsCall::BotError {
                code: "start.exited.bot.container".to_string(),
                error: "failed to start".to_string(),
                bot_id: "bot2".to_string(),
            },
        ]
    );
    // Only the successfully restarted bot is reconnected.
    assert_eq!(ctx.pool.calls(), vec![PoolCall::Reconnect(vec![b1])]);
}

#[tokio::test]
async fn restart_ignores_live_and_unknown_containers() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let stray = bot("ghost");
    ctx.manager.running_bots = vec![b1.clone()];
    ctx.containers.set_containers(vec![running(&b1, "cid1"), exited(&stray, "cid9")]);

    ctx.manager.restart_exited_bots().await.unwrap();

    assert_eq!(ctx.containers.calls(), vec![ContainerCall::LoadContainers]);
    assert!(ctx.metrics.calls().is_empty());
    // The pool still hears the (empty) reconnect so it can reconcile.
    assert_eq!(ctx.pool.calls(), vec![PoolCall::Reconnect(vec![])]);
}

#[tokio::test]
async fn restart_surfaces_container_listing_failure() {
    let ctx = setup();
    ctx.containers.fail_load("engine gone");
    let result = ctx.manager.restart_exited_bots().await;
    assert!(matches!(result, Err(LifecycleError::LoadBotContainers(_))));
}

#[tokio::test]
async fn inactive_bots_are_stopped_without_mutating_the_running_set() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    ctx.manager.running_bots = vec![b1.clone(), b2.clone()];
    ctx.monitor.set_inactive(ids(&["bot2", "unknown"]));

    ctx.manager.exit_inactive_bots().await.unwrap();

    // Only the known inactive bot is stopped; unknown IDs are ignored.
    assert_eq!(ctx.containers.calls(), vec![ContainerCall::Stop(b2.clone())]);
    assert!(ctx.metrics.calls().is_empty());
    assert!(ctx.pool.calls().is_empty());
    assert_eq!(ctx.manager.running_bots(), &[b1, b2]);
}

#[tokio::test]
async fn failed_stop_is_reported_per_bot() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    ctx.manager.running_bots = vec![b1.clone()];
    ctx.monitor.set_inactive(ids(&["bot1"]));
    ctx.containers.fail_stop("bot1", "no response");

    ctx.manager.exit_inactive_bots().await.unwrap();

    assert_eq!(
        ctx.metrics.calls(),
        vec![MetricsCall::BotError {
            code: "stop.bot".to_string(),
            error: "no response".to_string(),
            bot_id: "bot1".to_string(),
        }]
    );
}

#[tokio::test]
async fn cleanup_removes_only_stray_containers() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let stray = bot("bot2");
    ctx.manager.running_bots = vec![b1.clone()];
    ctx.containers.set_containers(vec![running(&b1, "cid1"), exited(&stray, "cid2")]);

    ctx.manager.cleanup_unused_bots().await.unwrap();

    assert_eq!(
        ctx.containers.calls(),
        vec![
            ContainerCall::LoadContainers,
            ContainerCall::TearDown { name: stray.container_name(), remove_payload: true },
        ]
    );
    assert_eq!(ctx.manager.running_bots(), &[b1]);
}

#[tokio::test]
async fn cleanup_absorbs_teardown_failures() {
    let ctx = setup();
    let stray = bot("bot2");
    ctx.containers.set_containers(vec![exited(&stray, "cid2")]);
    ctx.containers.fail_teardown(&stray.container_name(), "device busy");

    ctx.manager.cleanup_unused_bots().await.unwrap();

    assert!(ctx.metrics.calls().is_empty());
}

#[tokio::test]
async fn teardown_drains_pool_then_keeps_payloads() {
    let mut ctx = setup();
    let b1 = bot("bot1");
    let b2 = bot("bot2");
    ctx.manager.running_bots = vec![b1.clone(), b2.clone()];

    ctx.manager.tear_down_running_bots().await;

    assert_eq!(ctx.pool.calls(), vec![PoolCall::Remove(vec![b1.clone(), b2.clone()])]);
    // Graceful shutdown keeps the data volumes.
    assert_eq!(
        ctx.containers.calls(),
        vec![
            ContainerCall::TearDown { name: b1.container_name(), remove_payload: false },
            ContainerCall::TearDown { name: b2.container_name(), remove_payload: false },
        ]
    );
    let remove_pos = ctx.journal.position("pool.remove:bot1,bot2").unwrap();
    let teardown_pos = ctx
        .journal
        .position(&format!("containers.teardown:{}", b1.container_name()))
        .unwrap();
    assert!(remove_pos < teardown_pos);
    assert!(ctx.manager.running_bots().is_empty());
}
