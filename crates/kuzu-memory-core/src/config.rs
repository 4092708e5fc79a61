//! Engine configuration.
//!
//! A plain, `Default`-implementing value type. Reading configuration from
//! disk (YAML/TOML, env vars, CLI flags) is deliberately left to whatever
//! embeds this crate — the core never touches the filesystem for its own
//! settings, only for the memory database itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enhance::EnhancementFormat;
use crate::error::{KuzuMemoryError, Result};
use crate::memory::MemoryType;
use crate::recall::{RecallWeights, StrategyChoice};

/// Engine-wide tunables (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Where the SQLite database lives. `None` opens an in-memory store.
    pub db_path: Option<std::path::PathBuf>,

    /// Maximum memories returned by a single recall (§4.5).
    pub recall_limit: usize,
    /// Hard wall-clock budget for a recall call; strategies still running
    /// past it are abandoned and their partial results discarded (§4.6).
    #[serde(with = "duration_millis")]
    pub recall_deadline: Duration,
    /// Strategy used when a caller doesn't pick one explicitly (§4.8).
    pub recall_default_strategy: StrategyChoice,
    /// Weight given to the keyword strategy's normalized score in the
    /// merged recall score (§4.5, §6).
    pub recall_keyword_weight: f64,
    /// Weight given to the entity strategy's normalized score.
    pub recall_entity_weight: f64,
    /// Weight given to the temporal strategy's normalized score.
    pub recall_temporal_weight: f64,
    /// α: weight given to a memory's own importance in the merged score.
    pub recall_importance_weight: f64,
    /// β: weight given to a memory's freshness in the merged score.
    pub recall_freshness_weight: f64,

    /// Retention window per cognitive type; `None` means "never expires"
    /// (§6 `retention.<type>_ttl`). Defaults mirror
    /// [`MemoryType::default_retention`].
    pub retention_semantic_ttl: Option<Duration>,
    pub retention_procedural_ttl: Option<Duration>,
    pub retention_episodic_ttl: Option<Duration>,
    pub retention_working_ttl: Option<Duration>,
    pub retention_sensory_ttl: Option<Duration>,
    pub retention_preference_ttl: Option<Duration>,

    /// Soft cap on the on-disk database size; `None` disables the check
    /// (§6 `storage.max_size_mb`).
    pub storage_max_size_mb: Option<u64>,
    /// Whether exceeding `storage_max_size_mb` triggers a `VACUUM` before
    /// giving up (§6 `storage.auto_compact`).
    pub storage_auto_compact: bool,

    /// Bound on the async learning queue's depth (§4.8).
    pub queue_capacity: usize,
    /// Worker threads draining the learning queue.
    pub queue_workers: usize,
    /// Where undrained queue tasks are spilled on `shutdown` so they can
    /// be replayed on the next `Engine::open` (§4.8). `None` disables
    /// spilling — undrained tasks are simply lost.
    pub spill_path: Option<std::path::PathBuf>,
    /// Default wait on `shutdown` for the queue to drain before spilling
    /// what's left (§6 `async.drain_deadline_ms`).
    #[serde(with = "duration_millis")]
    pub queue_drain_deadline: Duration,

    /// Whether the recall cache is consulted/populated at all; `false`
    /// makes every `attach_memories` call a guaranteed miss (§6
    /// `cache.enabled`).
    pub cache_enabled: bool,
    /// Entries retained by the recall cache (§4.9).
    pub cache_capacity: usize,
    /// How long a cached recall result stays fresh before being treated as
    /// a miss (§4.9).
    #[serde(with = "duration_millis")]
    pub cache_ttl: Duration,

    /// Character budget for an enhanced prompt's injected context (§4.7).
    pub enhancement_char_budget: usize,
    /// Format used when a caller doesn't request one explicitly (§4.8).
    pub enhancement_default_format: EnhancementFormat,

    /// Minimum extractor confidence for a candidate memory to be stored
    /// automatically (§4.3).
    pub min_extraction_confidence: f64,
    /// Whether to layer a secondary NLP-ish confidence boost on top of the
    /// rule-based classifier (§6 `extraction.enable_nlp_classification`).
    pub extraction_enable_nlp_classification: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            recall_limit: 10,
            recall_deadline: Duration::from_millis(200),
            recall_default_strategy: StrategyChoice::Auto,
            recall_keyword_weight: RecallWeights::default().keyword,
            recall_entity_weight: RecallWeights::default().entity,
            recall_temporal_weight: RecallWeights::default().temporal,
            recall_importance_weight: RecallWeights::default().importance,
            recall_freshness_weight: RecallWeights::default().freshness,
            retention_semantic_ttl: MemoryType::Semantic.default_retention().map(duration_from_chrono),
            retention_procedural_ttl: MemoryType::Procedural.default_retention().map(duration_from_chrono),
            retention_episodic_ttl: MemoryType::Episodic.default_retention().map(duration_from_chrono),
            retention_working_ttl: MemoryType::Working.default_retention().map(duration_from_chrono),
            retention_sensory_ttl: MemoryType::Sensory.default_retention().map(duration_from_chrono),
            retention_preference_ttl: MemoryType::Preference.default_retention().map(duration_from_chrono),
            storage_max_size_mb: None,
            storage_auto_compact: false,
            queue_capacity: 1_000,
            queue_workers: 2,
            spill_path: None,
            queue_drain_deadline: Duration::from_secs(5),
            cache_enabled: true,
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(60),
            enhancement_char_budget: 2_000,
            enhancement_default_format: EnhancementFormat::Context,
            min_extraction_confidence: 0.5,
            extraction_enable_nlp_classification: false,
        }
    }
}

impl EngineConfig {
    /// Reject combinations that would make the engine impossible to run
    /// correctly rather than merely suboptimal.
    pub fn validate(&self) -> Result<()> {
        if self.recall_limit == 0 {
            return Err(KuzuMemoryError::ConfigError(
                "recall_limit must be at least 1".into(),
            ));
        }
        if self.queue_workers == 0 {
            return Err(KuzuMemoryError::ConfigError(
                "queue_workers must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_extraction_confidence) {
            return Err(KuzuMemoryError::ConfigError(
                "min_extraction_confidence must be in [0, 1]".into(),
            ));
        }
        if self.enhancement_char_budget == 0 {
            return Err(KuzuMemoryError::ConfigError(
                "enhancement_char_budget must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Configured retention window for `memory_type`, as a [`chrono::Duration`]
    /// ready to add to `created_at` (§6 `retention.<type>_ttl`).
    pub fn retention_ttl(&self, memory_type: MemoryType) -> Option<chrono::Duration> {
        let std_duration = match memory_type {
            MemoryType::Semantic => self.retention_semantic_ttl,
            MemoryType::Procedural => self.retention_procedural_ttl,
            MemoryType::Episodic => self.retention_episodic_ttl,
            MemoryType::Working => self.retention_working_ttl,
            MemoryType::Sensory => self.retention_sensory_ttl,
            MemoryType::Preference => self.retention_preference_ttl,
        };
        std_duration.and_then(|d| chrono::Duration::from_std(d).ok())
    }

    /// This config's recall-scoring weights, as consumed by the
    /// coordinator (§4.5 step 3, §6).
    pub fn recall_weights(&self) -> RecallWeights {
        RecallWeights {
            keyword: self.recall_keyword_weight,
            entity: self.recall_entity_weight,
            temporal: self.recall_temporal_weight,
            importance: self.recall_importance_weight,
            freshness: self.recall_freshness_weight,
        }
    }
}

fn duration_from_chrono(d: chrono::Duration) -> Duration {
    d.to_std().unwrap_or(Duration::ZERO)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_recall_limit_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.recall_limit = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.min_extraction_confidence = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_retention_ttl_matches_memory_type_defaults() {
        let cfg = EngineConfig::default();
        assert!(cfg.retention_ttl(MemoryType::Semantic).is_none());
        assert_eq!(cfg.retention_ttl(MemoryType::Working), Some(chrono::Duration::days(1)));
    }

    #[test]
    fn test_recall_weights_reflects_config_fields() {
        let mut cfg = EngineConfig::default();
        cfg.recall_keyword_weight = 0.9;
        assert_eq!(cfg.recall_weights().keyword, 0.9);
    }
}
