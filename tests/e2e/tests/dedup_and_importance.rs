use e2e_harness::TestEngine;
use kuzu_memory_core::MemoryFilters;

#[test]
fn remembering_the_same_fact_twice_deduplicates_by_content_hash() {
    let harness = TestEngine::open();

    harness
        .engine
        .remember("I prefer tabs over spaces", MemoryFilters::default())
        .unwrap();
    harness
        .engine
        .remember("I   prefer tabs over spaces", MemoryFilters::default())
        .unwrap();

    let recent = harness
        .engine
        .recent(&MemoryFilters::default(), 50)
        .unwrap();

    let matches: Vec<_> = recent
        .iter()
        .filter(|m| m.content.to_lowercase().contains("tabs over spaces"))
        .collect();
    assert_eq!(matches.len(), 1, "duplicate content should collapse to one row");
}

#[test]
fn distinct_facts_are_stored_separately() {
    let harness = TestEngine::open();

    harness
        .engine
        .remember("I prefer tabs over spaces", MemoryFilters::default())
        .unwrap();
    harness
        .engine
        .remember("I prefer light mode over dark mode", MemoryFilters::default())
        .unwrap();

    let stats = harness.engine.stats().unwrap();
    assert_eq!(stats.memory_count, 2);
}
