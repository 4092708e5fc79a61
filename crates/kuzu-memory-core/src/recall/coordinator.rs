//! Recall Coordinator (C6)
//!
//! Picks which strategies apply to a query, runs them concurrently under
//! one deadline, and fuses their ranked results into a single list. A
//! strategy that hasn't reported back by the deadline is abandoned — its
//! partial work is discarded and the result is flagged `degraded` rather
//! than made to wait. Strategies run on detached threads rather than
//! scoped ones: a scope joins every spawned thread before returning,
//! which would silently erase the deadline the moment one strategy ran
//! long.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::error::Result;
use crate::extraction::extract_entity_mentions;
use crate::memory::{Memory, ScoredMemory, StrategyKind};
use crate::store::{recency_score, MemoryStore};

use super::query::{RecallQuery, StrategyChoice};
use super::strategies::{has_temporal_signal, EntityStrategy, KeywordStrategy, Strategy, TemporalStrategy};

/// Per-strategy and per-signal weights feeding the merged recall score
/// (§4.5 step 3, §6).
#[derive(Debug, Clone, Copy)]
pub struct RecallWeights {
    pub keyword: f64,
    pub entity: f64,
    pub temporal: f64,
    /// α: how much a memory's own importance contributes to its merged
    /// score, independent of which strategy surfaced it.
    pub importance: f64,
    /// β: how much recency (relative to `valid_from`) contributes.
    pub freshness: f64,
}

impl Default for RecallWeights {
    fn default() -> Self {
        Self {
            keyword: 0.5,
            entity: 0.3,
            temporal: 0.2,
            importance: 0.15,
            freshness: 0.10,
        }
    }
}

impl RecallWeights {
    fn for_kind(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::Keyword => self.keyword,
            StrategyKind::Entity => self.entity,
            StrategyKind::Temporal => self.temporal,
        }
    }
}

pub struct RecallCoordinator {
    store: Arc<MemoryStore>,
    strategies: Vec<Arc<dyn Strategy>>,
    deadline: Duration,
    weights: RecallWeights,
}

/// Outcome of one coordinated recall.
pub struct RecallOutcome {
    pub memories: Vec<ScoredMemory>,
    pub degraded: bool,
}

impl RecallCoordinator {
    pub fn new(store: Arc<MemoryStore>, deadline: Duration, weights: RecallWeights) -> Self {
        Self {
            store,
            strategies: vec![
                Arc::new(KeywordStrategy),
                Arc::new(EntityStrategy),
                Arc::new(TemporalStrategy),
            ],
            deadline,
            weights,
        }
    }

    /// Which strategies are worth running for this query. An explicit
    /// `choice` other than `Auto` pins the strategy set directly; `Auto`
    /// falls back to inspecting the query text so a plain factual
    /// question doesn't pay for a pointless entity scan (§4.6, §4.8).
    fn select_strategies(&self, query_text: &str, choice: StrategyChoice) -> Vec<Arc<dyn Strategy>> {
        let by_kind = |kind: StrategyKind| -> Arc<dyn Strategy> {
            self.strategies
                .iter()
                .find(|s| s.kind() == kind)
                .cloned()
                .expect("all StrategyKind variants have a registered strategy")
        };

        match choice {
            StrategyChoice::Keyword => return vec![by_kind(StrategyKind::Keyword)],
            StrategyChoice::Entity => return vec![by_kind(StrategyKind::Entity)],
            StrategyChoice::Temporal => return vec![by_kind(StrategyKind::Temporal)],
            StrategyChoice::Hybrid => return self.strategies.clone(),
            StrategyChoice::Auto => {}
        }

        let mut selected: Vec<Arc<dyn Strategy>> = Vec::new();
        for strategy in &self.strategies {
            let applies = match strategy.kind() {
                StrategyKind::Keyword => true,
                StrategyKind::Entity => !extract_entity_mentions(query_text).is_empty(),
                StrategyKind::Temporal => has_temporal_signal(query_text),
            };
            if applies {
                selected.push(strategy.clone());
            }
        }
        if selected.is_empty() {
            selected.push(self.strategies[0].clone());
        }
        selected
    }

    /// Run the applicable strategies concurrently, bounded by this
    /// coordinator's deadline, and fuse their output with the weighted
    /// scoring formula (§4.5, §4.6).
    pub fn recall(&self, query: &RecallQuery) -> Result<RecallOutcome> {
        let selected = self.select_strategies(&query.text, query.strategy);
        let expected = selected.len();

        let (tx, rx) = mpsc::channel::<(StrategyKind, Result<Vec<(Memory, f64)>>)>();

        for strategy in selected {
            let tx = tx.clone();
            let store = self.store.clone();
            let query = query.clone();
            std::thread::spawn(move || {
                let result = strategy.search(&store, &query);
                let _ = tx.send((strategy.kind(), result));
            });
        }
        drop(tx);

        let deadline_at = Instant::now() + self.deadline;
        let mut by_strategy: HashMap<StrategyKind, Vec<(Memory, f64)>> = HashMap::new();
        let mut degraded = false;

        loop {
            if by_strategy.len() >= expected {
                break;
            }
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                degraded = true;
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok((kind, Ok(results))) => {
                    by_strategy.insert(kind, results);
                }
                Ok((_, Err(_))) => {
                    degraded = true;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    degraded = true;
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        let memories = fuse(by_strategy, &self.weights);
        Ok(RecallOutcome { memories, degraded })
    }
}

/// Weighted linear combination of each strategy's min-max-normalized
/// score, plus importance and freshness terms (§4.5 step 3):
/// `merged = Σ wᵢ·normalize(scoreᵢ) + α·importance + β·freshness(valid_from)`.
fn fuse(by_strategy: HashMap<StrategyKind, Vec<(Memory, f64)>>, weights: &RecallWeights) -> Vec<ScoredMemory> {
    let now = Utc::now();
    let mut fused: HashMap<String, (Memory, f64, Vec<StrategyKind>)> = HashMap::new();

    for (kind, results) in by_strategy {
        let min = results.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
        let max = results.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        for (memory, raw_score) in results {
            let normalized = if range.abs() < f64::EPSILON { 1.0 } else { (raw_score - min) / range };
            let contribution = weights.for_kind(kind) * normalized;

            let entry = fused
                .entry(memory.id.clone())
                .or_insert_with(|| (memory.clone(), 0.0, Vec::new()));
            entry.1 += contribution;
            if !entry.2.contains(&kind) {
                entry.2.push(kind);
            }
        }
    }

    let mut scored: Vec<ScoredMemory> = fused
        .into_values()
        .map(|(memory, strategy_score, matched_by)| {
            let freshness = recency_score(memory.valid_from, now, memory.memory_type.half_life());
            let score = strategy_score + weights.importance * memory.importance + weights.freshness * freshness;
            ScoredMemory { memory, score, matched_by }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SqliteAdapter;
    use crate::memory::{EntityKind, EntityMention, MemoryFilters, MemoryType};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn new_memory(content: &str) -> Memory {
        let now = Utc::now();
        Memory {
            id: String::new(),
            content: content.to_string(),
            content_hash: String::new(),
            memory_type: MemoryType::Semantic,
            importance: 1.0,
            confidence: 0.9,
            created_at: now,
            valid_from: now,
            valid_to: None,
            source: None,
            session_id: None,
            agent_id: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_select_strategies_always_includes_keyword() {
        let store = Arc::new(MemoryStore::new(SqliteAdapter::open_in_memory().unwrap()));
        let coordinator = RecallCoordinator::new(store, Duration::from_millis(200), RecallWeights::default());
        let selected = coordinator.select_strategies("what database do we use", StrategyChoice::Auto);
        assert!(selected.iter().any(|s| s.kind() == StrategyKind::Keyword));
    }

    #[test]
    fn test_select_strategies_adds_temporal_on_signal() {
        let store = Arc::new(MemoryStore::new(SqliteAdapter::open_in_memory().unwrap()));
        let coordinator = RecallCoordinator::new(store, Duration::from_millis(200), RecallWeights::default());
        let selected = coordinator.select_strategies("what did we decide yesterday", StrategyChoice::Auto);
        assert!(selected.iter().any(|s| s.kind() == StrategyKind::Temporal));
    }

    #[test]
    fn test_select_strategies_explicit_choice_pins_single_strategy() {
        let store = Arc::new(MemoryStore::new(SqliteAdapter::open_in_memory().unwrap()));
        let coordinator = RecallCoordinator::new(store, Duration::from_millis(200), RecallWeights::default());
        let selected = coordinator.select_strategies("what did we decide yesterday", StrategyChoice::Keyword);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].kind(), StrategyKind::Keyword);
    }

    #[test]
    fn test_recall_fuses_and_ranks_results() {
        let store = Arc::new(MemoryStore::new(SqliteAdapter::open_in_memory().unwrap()));
        let mention = EntityMention {
            surface_form: "Rust".into(),
            kind: EntityKind::Technology,
            offset: 0,
            confidence: 0.9,
        };
        store
            .put(new_memory("we use Rust for the backend"), std::slice::from_ref(&mention))
            .unwrap();
        store.put(new_memory("unrelated memory about lunch"), &[]).unwrap();

        let coordinator = RecallCoordinator::new(store, Duration::from_millis(500), RecallWeights::default());
        let query = RecallQuery::new("tell me about Rust").with_filters(MemoryFilters::default());
        let outcome = coordinator.recall(&query).unwrap();

        assert!(!outcome.memories.is_empty());
        assert!(outcome.memories[0].memory.content.contains("Rust"));
    }
}
