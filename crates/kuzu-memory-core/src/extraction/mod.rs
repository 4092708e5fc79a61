//! Extractor (C3)
//!
//! Turns raw conversational text into candidate [`Memory`] drafts: split
//! into fragments, classify each fragment's cognitive type, and pull out
//! entity mentions. Nothing here touches the store — the engine decides
//! what clears the confidence bar and what gets persisted.

mod classifier;
mod entities;
mod patterns;

pub use classifier::{Classifier, EnhancedClassifier, RuleClassifier};
pub use entities::extract_entity_mentions;
pub use patterns::{resolve_tie, segment_into_candidates, PRIORITY_ORDER};

use crate::memory::{EntityMention, MemoryType};

/// One candidate memory pulled out of raw text, not yet persisted.
#[derive(Debug, Clone)]
pub struct MemoryDraft {
    pub content: String,
    pub memory_type: MemoryType,
    pub confidence: f64,
    pub entities: Vec<EntityMention>,
}

/// Something that turns raw text into candidate memories.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<MemoryDraft>;
}

/// Default `Extractor`: sentence segmentation, rule-based classification,
/// and glossary/capitalization-based entity extraction.
pub struct RuleExtractor<C: Classifier = RuleClassifier> {
    classifier: C,
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self {
            classifier: RuleClassifier,
        }
    }
}

impl<C: Classifier> RuleExtractor<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }
}

impl<C: Classifier> Extractor for RuleExtractor<C> {
    fn extract(&self, text: &str) -> Vec<MemoryDraft> {
        segment_into_candidates(text)
            .into_iter()
            .map(|fragment| {
                let (memory_type, confidence) = self.classifier.classify(&fragment);
                let entities = extract_entity_mentions(&fragment);
                MemoryDraft {
                    content: fragment,
                    memory_type,
                    confidence,
                    entities,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_produces_one_draft_per_sentence() {
        let extractor = RuleExtractor::default();
        let drafts = extractor.extract("I prefer dark mode. We use PostgreSQL for storage.");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].memory_type, MemoryType::Preference);
    }

    #[test]
    fn test_extract_attaches_entity_mentions() {
        let extractor = RuleExtractor::default();
        let drafts = extractor.extract("We migrated the API from MySQL to PostgreSQL");
        assert!(!drafts[0].entities.is_empty());
    }
}
