use serde::{Deserialize, Serialize};

use crate::memory::MemoryFilters;

/// Which recall strategy to run, or `Auto` to let the coordinator decide
/// from the query text (§4.5, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    #[default]
    Auto,
    Keyword,
    Entity,
    Temporal,
    Hybrid,
}

/// A recall request: free text plus scoping filters.
#[derive(Debug, Clone)]
pub struct RecallQuery {
    pub text: String,
    pub filters: MemoryFilters,
    pub limit: usize,
    pub strategy: StrategyChoice,
}

impl RecallQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: MemoryFilters::default(),
            limit: 10,
            strategy: StrategyChoice::Auto,
        }
    }

    pub fn with_filters(mut self, filters: MemoryFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyChoice) -> Self {
        self.strategy = strategy;
        self
    }
}
