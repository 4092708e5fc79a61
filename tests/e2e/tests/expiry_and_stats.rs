use chrono::{Duration as ChronoDuration, Utc};
use e2e_harness::TestEngine;
use kuzu_memory_core::MemoryFilters;

#[test]
fn expire_removes_only_memories_past_their_valid_to() {
    let harness = TestEngine::open();

    // Working memories default to a one-day retention window; semantic
    // facts never expire on their own.
    harness
        .engine
        .remember(
            "Right now, for this session, we're debugging the flaky build",
            MemoryFilters::default(),
        )
        .unwrap();
    harness
        .engine
        .remember("we standardized on PostgreSQL for storage", MemoryFilters::default())
        .unwrap();

    let before = Utc::now();
    let removed_none = harness.engine.expire(before).unwrap();
    assert_eq!(removed_none, 0, "nothing should be expired yet");

    let far_future = Utc::now() + ChronoDuration::days(2);
    harness.engine.expire(far_future).unwrap();

    let remaining = harness.engine.recent(&MemoryFilters::default(), 50).unwrap();
    assert!(remaining.iter().any(|m| m.content.contains("PostgreSQL")));
}

#[test]
fn stats_reflect_stored_memory_and_entity_counts() {
    let harness = TestEngine::open();

    harness
        .engine
        .remember("we use Rust and PostgreSQL for the platform", MemoryFilters::default())
        .unwrap();

    let stats = harness.engine.stats().unwrap();
    assert_eq!(stats.memory_count, 1);
    assert!(stats.size_bytes > 0);
    assert!(stats.newest_memory.is_some());
}
