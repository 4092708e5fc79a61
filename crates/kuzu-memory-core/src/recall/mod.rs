//! Recall: strategies (C5) and their deadline-bounded coordinator (C6).

mod coordinator;
mod query;
mod strategies;

pub use coordinator::{RecallCoordinator, RecallOutcome, RecallWeights};
pub use query::{RecallQuery, StrategyChoice};
pub use strategies::{EntityStrategy, KeywordStrategy, Strategy, TemporalStrategy};
