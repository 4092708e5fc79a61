use e2e_harness::TestEngine;
use kuzu_memory_core::MemoryFilters;

#[test]
fn remembered_preference_is_recalled_into_prompt() {
    let harness = TestEngine::open();

    let stored = harness
        .engine
        .remember("I prefer dark mode in my editor", MemoryFilters::default())
        .expect("remember should succeed");
    assert_eq!(stored.len(), 1);

    let context = harness
        .engine
        .attach_memories("what theme should I use?", None, None, MemoryFilters::default(), None)
        .expect("attach_memories should succeed");

    assert!(context.enhanced_prompt.contains("dark mode"));
    assert!(!context.memories.is_empty());
    assert!(context.enhanced_prompt.contains(&context.prompt));
}

#[test]
fn recall_with_no_stored_memories_passes_prompt_through_unchanged() {
    let harness = TestEngine::open();

    let context = harness
        .engine
        .attach_memories("anything interesting?", None, None, MemoryFilters::default(), None)
        .expect("attach_memories should succeed even with nothing stored");

    assert_eq!(context.enhanced_prompt, context.prompt);
    assert!(context.memories.is_empty());
}

#[test]
fn recall_survives_an_engine_reopen_against_the_same_database() {
    let harness = TestEngine::open();
    harness
        .engine
        .remember("we standardized on PostgreSQL for storage", MemoryFilters::default())
        .unwrap();

    let harness = harness.reopen();
    let context = harness
        .engine
        .attach_memories("what database do we use?", None, None, MemoryFilters::default(), None)
        .unwrap();

    assert!(context.enhanced_prompt.contains("PostgreSQL"));
}
