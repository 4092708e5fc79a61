//! Memory module — core data types for the memory graph.
//!
//! - [`Memory`] — one atomic piece of remembered text, with temporal
//!   bounds and content-hash dedup.
//! - [`Entity`] / [`EntityMention`] — normalized noun-phrases linked to
//!   memories.
//! - [`MemoryContext`] — the transient result of prompt enhancement.

mod context;
mod entity;
mod record;

pub use context::{EngineStats, MemoryContext, ScoredMemory, StrategyKind};
pub use entity::{Entity, EntityKind, EntityMention};
pub use record::{
    content_hash, normalize_content, MemoryType, MetaValue, Memory, MAX_CONTENT_CHARS,
    MAX_METADATA_BYTES, MAX_SOURCE_CHARS,
};

/// Read-side filters shared by store queries and recall strategies (§4.2,
/// §4.5). Filters only restrict results when explicitly set — never
/// silently scoped to a caller's own agent/session (§4.5 step 4).
#[derive(Debug, Clone, Default)]
pub struct MemoryFilters {
    pub agent_id: Option<String>,
    pub session_id: Option<String>,
    pub source: Option<String>,
    pub memory_type: Option<MemoryType>,
}

impl MemoryFilters {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none()
            && self.session_id.is_none()
            && self.source.is_none()
            && self.memory_type.is_none()
    }

    /// A stable fingerprint for cache keys (§4.9).
    pub fn fingerprint(&self) -> String {
        format!(
            "a={:?}|s={:?}|src={:?}|t={:?}",
            self.agent_id,
            self.session_id,
            self.source,
            self.memory_type.map(|t| t.as_str())
        )
    }
}
