//! Transient result types returned by enhancement and stats operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Memory;

/// A memory as it appears in a ranked recall result, with its merged score
/// and which strategy contributed it (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f64,
    pub matched_by: Vec<StrategyKind>,
}

/// Which recall strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Keyword,
    Entity,
    Temporal,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StrategyKind::Keyword => "keyword",
            StrategyKind::Entity => "entity",
            StrategyKind::Temporal => "temporal",
        };
        write!(f, "{s}")
    }
}

/// Transient result of enhancement: the original prompt, selected
/// memories, the enhanced prompt text, and timing annotations (§3). Never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    pub prompt: String,
    pub enhanced_prompt: String,
    pub memories: Vec<ScoredMemory>,
    pub took_ms: u64,
    /// Set when recall degraded (deadline elapsed, a strategy failed) so
    /// callers can tell a genuinely-empty result from a degraded one.
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl MemoryContext {
    /// An unchanged-prompt context, used when the store is empty or recall
    /// fails entirely (§7, §8: "always return something usable").
    pub fn passthrough(prompt: &str, degraded: bool) -> Self {
        Self {
            prompt: prompt.to_string(),
            enhanced_prompt: prompt.to_string(),
            memories: Vec::new(),
            took_ms: 0,
            degraded,
            generated_at: Utc::now(),
        }
    }
}

/// Aggregate store + queue + cache metrics (§4.8 `stats`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub memory_count: i64,
    pub entity_count: i64,
    pub size_bytes: i64,
    pub oldest_memory: Option<DateTime<Utc>>,
    pub newest_memory: Option<DateTime<Utc>>,
    pub queue_queued: usize,
    pub queue_running: usize,
    pub queue_done: usize,
    pub queue_failed: usize,
    pub queue_dropped: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
}
