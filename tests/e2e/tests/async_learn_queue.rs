use std::time::Duration;

use e2e_harness::TestEngine;
use kuzu_memory_core::{LearnTask, MemoryFilters};

#[tokio::test]
async fn learn_enqueues_without_blocking_and_eventually_lands_in_the_store() {
    let harness = TestEngine::open();

    let accepted = harness
        .engine
        .learn(LearnTask::new("I prefer vim keybindings"))
        .await
        .unwrap();
    assert!(accepted);

    let mut found = false;
    for _ in 0..50 {
        let recent = harness.engine.recent(&MemoryFilters::default(), 10).unwrap();
        if recent.iter().any(|m| m.content.contains("vim keybindings")) {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(found, "learned text should show up in the store once the worker drains it");
}

#[tokio::test]
async fn shutdown_drains_pending_learn_tasks_before_returning() {
    let harness = TestEngine::open();

    for i in 0..5 {
        harness
            .engine
            .learn(LearnTask::new(format!("fact number {i} about the system")))
            .await
            .unwrap();
    }

    harness.engine.shutdown(Some(Duration::from_secs(2))).await.unwrap();

    let stats = harness.engine.stats().unwrap();
    assert_eq!(stats.memory_count, 5);
}

#[tokio::test]
async fn learn_after_shutdown_reports_store_unavailable() {
    let harness = TestEngine::open();
    harness.engine.shutdown(Some(Duration::from_secs(1))).await.unwrap();

    let result = harness.engine.learn(LearnTask::new("too late")).await;
    assert!(result.is_err());
}
