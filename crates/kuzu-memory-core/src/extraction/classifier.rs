//! Rule-based cognitive-type classification (C4).
//!
//! Scores a text fragment against marker phrases for each [`MemoryType`]
//! and returns the top-scoring type with a confidence in `[0, 1]`. Pure
//! heuristic, no model weights to load or train — mirrors how a
//! human skim-reads for "this sounds like a preference" versus "this
//! sounds like a fact".

use crate::memory::MemoryType;

use super::patterns::resolve_tie;
use super::entities::extract_entity_mentions;

/// Something that assigns a cognitive type + confidence to a text
/// fragment.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> (MemoryType, f64);
}

/// Tie tolerance for [`resolve_tie`] — candidates within this much of the
/// top score are treated as tied rather than ranked by raw score.
const TIE_EPSILON: f64 = 1e-9;

struct TypeSignals {
    memory_type: MemoryType,
    /// Anchors anywhere in the text; each hit adds its weight.
    contains: &'static [(&'static str, f64)],
    /// Anchors only scored when they open the fragment.
    starts_with: &'static [(&'static str, f64)],
}

const SIGNALS: &[TypeSignals] = &[
    TypeSignals {
        memory_type: MemoryType::Preference,
        contains: &[
            ("i prefer", 0.9),
            ("i like", 0.7),
            ("i don't like", 0.7),
            ("i hate", 0.7),
            ("my favorite", 0.85),
            ("i always use", 0.8),
            ("i never use", 0.8),
            ("would rather", 0.6),
        ],
        starts_with: &[("i prefer", 0.2), ("i like", 0.15), ("i want", 0.15)],
    },
    TypeSignals {
        memory_type: MemoryType::Procedural,
        contains: &[
            ("to do this", 0.7),
            ("step 1", 0.8),
            ("first,", 0.4),
            ("then,", 0.3),
            ("how to", 0.6),
            ("run `", 0.6),
            ("the steps are", 0.7),
            ("you need to", 0.5),
        ],
        starts_with: &[("to ", 0.15), ("first ", 0.2), ("run ", 0.2)],
    },
    TypeSignals {
        memory_type: MemoryType::Episodic,
        contains: &[
            ("we decided", 0.85),
            ("we chose", 0.8),
            ("we agreed", 0.8),
            ("last week", 0.5),
            ("yesterday", 0.5),
            ("on monday", 0.4),
            ("during the meeting", 0.6),
            ("the incident", 0.6),
        ],
        starts_with: &[("we decided", 0.2), ("we chose", 0.2)],
    },
    TypeSignals {
        memory_type: MemoryType::Working,
        contains: &[
            ("currently", 0.5),
            ("right now", 0.6),
            ("for this session", 0.8),
            ("today we are", 0.5),
            ("at the moment", 0.5),
            ("for now", 0.5),
        ],
        starts_with: &[("currently", 0.2), ("right now", 0.2)],
    },
    TypeSignals {
        memory_type: MemoryType::Sensory,
        contains: &[
            ("i see", 0.5),
            ("looks like", 0.5),
            ("appears to", 0.4),
            ("the screenshot shows", 0.7),
            ("the log shows", 0.6),
            ("the error says", 0.6),
        ],
        starts_with: &[("i see", 0.2), ("looks like", 0.2)],
    },
];

/// Default `Classifier`.
pub struct RuleClassifier;

impl Default for RuleClassifier {
    fn default() -> Self {
        Self
    }
}

impl Classifier for RuleClassifier {
    fn classify(&self, text: &str) -> (MemoryType, f64) {
        let lower = text.to_lowercase();
        let mut candidates = vec![(MemoryType::Semantic, 0.55_f64)];

        for signal in SIGNALS {
            let mut score = 0.0;
            for (anchor, weight) in signal.contains {
                if lower.contains(anchor) {
                    score += weight;
                }
            }
            for (anchor, weight) in signal.starts_with {
                if lower.starts_with(anchor) {
                    score += weight;
                }
            }

            if score > 0.0 {
                let normalized = (score / 1.5).min(1.0).max(0.55);
                candidates.push((signal.memory_type, normalized));
            }
        }

        let confidence = candidates
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::MIN, f64::max);
        let memory_type = resolve_tie(&candidates, TIE_EPSILON).unwrap_or(MemoryType::Semantic);

        (memory_type, confidence)
    }
}

/// Wraps [`RuleClassifier`] with a lightweight "NLP-ish" confidence boost
/// based on entity-mention density — a proxy for the richer contextual
/// signal a real NLP model would contribute, gated behind
/// `extraction.enable_nlp_classification` (§6) since it changes which
/// candidates clear the extraction confidence bar.
pub struct EnhancedClassifier {
    base: RuleClassifier,
}

impl Default for EnhancedClassifier {
    fn default() -> Self {
        Self { base: RuleClassifier }
    }
}

impl Classifier for EnhancedClassifier {
    fn classify(&self, text: &str) -> (MemoryType, f64) {
        let (memory_type, confidence) = self.base.classify(text);
        let mention_count = extract_entity_mentions(text).len();
        let boost = (mention_count as f64 * 0.05).min(0.15);
        (memory_type, (confidence + boost).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_preference() {
        let (t, c) = RuleClassifier.classify("I prefer dark mode over light mode");
        assert_eq!(t, MemoryType::Preference);
        assert!(c > 0.6);
    }

    #[test]
    fn test_classifies_procedural() {
        let (t, _) = RuleClassifier
            .classify("To deploy this service, first run the build, then push the image");
        assert_eq!(t, MemoryType::Procedural);
    }

    #[test]
    fn test_classifies_episodic() {
        let (t, _) = RuleClassifier.classify("We decided to migrate to PostgreSQL last week");
        assert_eq!(t, MemoryType::Episodic);
    }

    #[test]
    fn test_classifies_working() {
        let (t, _) = RuleClassifier.classify("Right now, for this session, we're debugging the flaky test");
        assert_eq!(t, MemoryType::Working);
    }

    #[test]
    fn test_falls_back_to_semantic() {
        let (t, c) = RuleClassifier.classify("The company was founded in 2004");
        assert_eq!(t, MemoryType::Semantic);
        assert!(c < 0.6);
    }
}
