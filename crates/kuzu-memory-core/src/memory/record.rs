//! The Memory record — the fundamental unit of stored knowledge.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cognitive classification of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// A stable fact or concept.
    #[default]
    Semantic,
    /// How-to knowledge; never decays.
    Procedural,
    /// An event or specific moment; decays over weeks.
    Episodic,
    /// Short-lived task-scoped context; decays within a day.
    Working,
    /// Raw, very short-lived perceptual context; decays within hours.
    Sensory,
    /// A stated user preference or opinion.
    Preference,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
            MemoryType::Episodic => "episodic",
            MemoryType::Working => "working",
            MemoryType::Sensory => "sensory",
            MemoryType::Preference => "preference",
        }
    }

    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "semantic" => MemoryType::Semantic,
            "procedural" => MemoryType::Procedural,
            "episodic" => MemoryType::Episodic,
            "working" => MemoryType::Working,
            "sensory" => MemoryType::Sensory,
            "preference" => MemoryType::Preference,
            _ => MemoryType::Semantic,
        }
    }

    /// Default importance assigned at creation (spec §3 table).
    pub fn default_importance(&self) -> f64 {
        match self {
            MemoryType::Semantic => 1.00,
            MemoryType::Procedural => 0.90,
            MemoryType::Preference => 0.90,
            MemoryType::Episodic => 0.70,
            MemoryType::Working => 0.50,
            MemoryType::Sensory => 0.30,
        }
    }

    /// Default retention window from `created_at`, or `None` for "never".
    pub fn default_retention(&self) -> Option<Duration> {
        match self {
            MemoryType::Semantic | MemoryType::Procedural | MemoryType::Preference => None,
            MemoryType::Episodic => Some(Duration::days(30)),
            MemoryType::Working => Some(Duration::days(1)),
            MemoryType::Sensory => Some(Duration::hours(6)),
        }
    }

    /// Half-life used by the temporal-decay recall score (§4.2).
    pub fn half_life(&self) -> Duration {
        match self {
            MemoryType::Semantic | MemoryType::Procedural => Duration::days(365),
            MemoryType::Preference => Duration::days(180),
            MemoryType::Episodic => Duration::days(7),
            MemoryType::Working => Duration::hours(12),
            MemoryType::Sensory => Duration::hours(2),
        }
    }

    /// Whether content normalization case-folds before hashing (§4.2).
    pub fn case_folds_for_hash(&self) -> bool {
        matches!(
            self,
            MemoryType::Preference | MemoryType::Sensory | MemoryType::Working
        )
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque, typed metadata value (§9: "dynamic metadata dictionaries"
/// re-expressed as a typed bag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// Serialized metadata size limit (§6).
pub const MAX_METADATA_BYTES: usize = 8 * 1024;
/// Content length limit (§6).
pub const MAX_CONTENT_CHARS: usize = 10_000;
/// Source tag length limit (§6).
pub const MAX_SOURCE_CHARS: usize = 128;

/// One atomic piece of remembered text (§3).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub id: String,
    /// The stored text.
    pub content: String,
    /// Stable hash of the normalized content; the dedup key (I1).
    pub content_hash: String,
    /// Cognitive type.
    pub memory_type: MemoryType,
    /// Importance in [0, 1].
    pub importance: f64,
    /// Extractor-reported confidence in [0, 1].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    /// When the memory becomes eligible for recall.
    pub valid_from: DateTime<Utc>,
    /// Expiry, or `None` for "never" (I2).
    pub valid_to: Option<DateTime<Utc>>,
    /// Free-form origin tag.
    pub source: Option<String>,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    /// Opaque to the core; size-bounded (§6).
    pub metadata: BTreeMap<String, MetaValue>,
}

impl Memory {
    /// Whether this memory is logically expired at the given instant (I4).
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_to.is_some_and(|t| t < at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether `at` falls within `[valid_from, valid_to]`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && !self.is_expired_at(at)
    }
}

/// Normalize content for hashing: trim, collapse internal whitespace runs,
/// and case-fold for types where surface casing carries no identifier
/// meaning (§4.2).
pub fn normalize_content(content: &str, memory_type: MemoryType) -> String {
    let collapsed = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if memory_type.case_folds_for_hash() {
        collapsed.to_lowercase()
    } else {
        collapsed
    }
}

/// Stable content hash used as the dedup key (I1). Not cryptographic —
/// only needs to be stable and low-collision for a single project's
/// memory set.
pub fn content_hash(normalized: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let a = normalize_content("  I prefer dark mode.  ", MemoryType::Preference);
        let b = normalize_content("I   prefer dark mode.", MemoryType::Preference);
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_case_folding_by_type() {
        let pref = normalize_content("I Prefer Dark Mode", MemoryType::Preference);
        assert_eq!(pref, "i prefer dark mode");

        let fact = normalize_content("We chose PostgreSQL", MemoryType::Semantic);
        assert_eq!(fact, "We chose PostgreSQL");
    }

    #[test]
    fn test_content_hash_stable_and_order_independent_of_formatting() {
        let h1 = content_hash(&normalize_content("  I prefer dark mode.  ", MemoryType::Preference));
        let h2 = content_hash(&normalize_content("I prefer dark mode.", MemoryType::Preference));
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_type_defaults() {
        assert_eq!(MemoryType::Semantic.default_importance(), 1.0);
        assert!(MemoryType::Semantic.default_retention().is_none());
        assert_eq!(
            MemoryType::Working.default_retention(),
            Some(Duration::days(1))
        );
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let mut m = Memory {
            id: "1".into(),
            content: "x".into(),
            content_hash: "h".into(),
            memory_type: MemoryType::Working,
            importance: 0.5,
            confidence: 0.8,
            created_at: now,
            valid_from: now,
            valid_to: Some(now - Duration::seconds(1)),
            source: None,
            session_id: None,
            agent_id: None,
            metadata: BTreeMap::new(),
        };
        assert!(m.is_expired_at(now));
        m.valid_to = Some(now + Duration::days(1));
        assert!(!m.is_expired_at(now));
    }
}
