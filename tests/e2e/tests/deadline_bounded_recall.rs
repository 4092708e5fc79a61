use std::time::Duration;

use e2e_harness::TestEngine;
use kuzu_memory_core::MemoryFilters;

#[test]
fn zero_deadline_returns_a_degraded_result_instead_of_blocking() {
    let harness = TestEngine::with_config(|cfg| {
        cfg.recall_deadline = Duration::from_millis(0);
    });

    harness
        .engine
        .remember("we deployed the new release on Friday", MemoryFilters::default())
        .unwrap();

    let context = harness
        .engine
        .attach_memories("what happened on Friday?", None, None, MemoryFilters::default(), None)
        .unwrap();

    assert!(context.degraded, "a zero-width deadline should abandon every strategy");
}

#[test]
fn generous_deadline_returns_undegraded_results() {
    let harness = TestEngine::with_config(|cfg| {
        cfg.recall_deadline = Duration::from_secs(5);
    });

    harness
        .engine
        .remember("we deployed the new release on Friday", MemoryFilters::default())
        .unwrap();

    let context = harness
        .engine
        .attach_memories("what happened on Friday?", None, None, MemoryFilters::default(), None)
        .unwrap();

    assert!(!context.degraded);
}
