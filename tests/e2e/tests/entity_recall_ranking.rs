use e2e_harness::TestEngine;
use kuzu_memory_core::MemoryFilters;

#[test]
fn entity_mention_ranks_above_unrelated_memories() {
    let harness = TestEngine::open();

    harness
        .engine
        .remember("We use Rust for all backend services", MemoryFilters::default())
        .unwrap();
    harness
        .engine
        .remember("Lunch today was sandwiches from the place downstairs", MemoryFilters::default())
        .unwrap();

    let context = harness
        .engine
        .attach_memories("tell me about our Rust backend", None, None, MemoryFilters::default(), None)
        .unwrap();

    assert!(!context.memories.is_empty());
    assert!(context.memories[0].memory.content.contains("Rust"));
}
