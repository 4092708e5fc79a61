use serde::{Deserialize, Serialize};

use crate::memory::MemoryFilters;

/// Relative importance used by the queue's drop policy: when the queue is
/// full, the lowest-priority queued task is evicted to make room for a
/// higher-priority arrival; an arrival no higher than everything already
/// queued is dropped outright (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

/// One unit of learning work: raw text to extract memories from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnTask {
    pub text: String,
    pub source: Option<String>,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    #[serde(skip)]
    pub priority: TaskPriority,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}

impl LearnTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            session_id: None,
            agent_id: None,
            priority: TaskPriority::Normal,
        }
    }

    pub fn filters(&self) -> MemoryFilters {
        MemoryFilters {
            agent_id: self.agent_id.clone(),
            session_id: self.session_id.clone(),
            source: self.source.clone(),
            memory_type: None,
        }
    }
}

/// Lifecycle state of a queued task, surfaced via [`crate::memory::EngineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Failed,
    Dropped,
}
