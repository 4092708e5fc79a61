//! Recall Strategies (C5)
//!
//! Each strategy is a narrow, independent way of turning a query into
//! scored memories. The coordinator runs a subset of these concurrently
//! and fuses their results — no strategy knows about any other.

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::extraction::extract_entity_mentions;
use crate::memory::{Memory, StrategyKind};
use crate::store::MemoryStore;

use super::query::RecallQuery;

/// A single way of finding memories relevant to a query.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn search(&self, store: &MemoryStore, query: &RecallQuery) -> Result<Vec<(Memory, f64)>>;
}

/// FTS5 keyword/full-text match (§4.5).
pub struct KeywordStrategy;

impl Strategy for KeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    fn search(&self, store: &MemoryStore, query: &RecallQuery) -> Result<Vec<(Memory, f64)>> {
        store.search_by_keywords(&query.text, &query.filters, query.limit)
    }
}

/// Match via entities mentioned in both the query and the memory (§4.5).
pub struct EntityStrategy;

impl Strategy for EntityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Entity
    }

    fn search(&self, store: &MemoryStore, query: &RecallQuery) -> Result<Vec<(Memory, f64)>> {
        let names: Vec<String> = extract_entity_mentions(&query.text)
            .into_iter()
            .map(|m| m.canonical_name())
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }
        store.search_by_entities(&names, &query.filters, query.limit)
    }
}

/// Recency-weighted match over a time window implied by the query text, or
/// a 30-day default when no temporal hint is present (§4.5).
pub struct TemporalStrategy;

impl Strategy for TemporalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Temporal
    }

    fn search(&self, store: &MemoryStore, query: &RecallQuery) -> Result<Vec<(Memory, f64)>> {
        let now = Utc::now();
        let from = now - parse_temporal_hint(&query.text).unwrap_or(Duration::days(30));
        store.search_by_time(from, now, &query.filters, query.limit)
    }
}

/// Very small set of relative-time markers. Anything unrecognized falls
/// back to the strategy's default window.
fn parse_temporal_hint(text: &str) -> Option<Duration> {
    let lower = text.to_lowercase();
    if lower.contains("today") || lower.contains("this session") {
        Some(Duration::hours(24))
    } else if lower.contains("yesterday") {
        Some(Duration::days(2))
    } else if lower.contains("this week") || lower.contains("last week") {
        Some(Duration::days(7))
    } else if lower.contains("this month") || lower.contains("last month") {
        Some(Duration::days(31))
    } else {
        None
    }
}

/// Does `text` look like it's asking about a point/window in time? Used by
/// the coordinator's auto-strategy-selection heuristic (§4.6).
pub fn has_temporal_signal(text: &str) -> bool {
    parse_temporal_hint(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temporal_hint_recognizes_yesterday() {
        assert_eq!(parse_temporal_hint("what did we do yesterday?"), Some(Duration::days(2)));
    }

    #[test]
    fn test_parse_temporal_hint_none_for_plain_query() {
        assert_eq!(parse_temporal_hint("what database do we use"), None);
    }

    #[test]
    fn test_has_temporal_signal() {
        assert!(has_temporal_signal("what happened last week"));
        assert!(!has_temporal_signal("what is our database"));
    }
}
