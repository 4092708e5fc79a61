//! Sentence segmentation and classifier tie-breaking.

use crate::memory::MemoryType;

/// Split raw text into candidate fragments worth classifying
/// independently — one memory per sentence/line rather than one memory
/// per message, so a single turn can yield a preference and a fact.
pub fn segment_into_candidates(text: &str) -> Vec<String> {
    text.split(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|s| s.trim())
        .filter(|s| s.chars().filter(|c| c.is_alphanumeric()).count() >= 4)
        .map(|s| s.to_string())
        .collect()
}

/// Priority order used to break ties when more than one [`MemoryType`]
/// scores equally on a fragment: an explicit stated preference or a
/// procedure outranks a loosely-implied fact or transient context.
pub const PRIORITY_ORDER: &[MemoryType] = &[
    MemoryType::Preference,
    MemoryType::Procedural,
    MemoryType::Episodic,
    MemoryType::Semantic,
    MemoryType::Working,
    MemoryType::Sensory,
];

/// Resolve a tie among equally (within `epsilon`) scored candidates by
/// [`PRIORITY_ORDER`].
pub fn resolve_tie(candidates: &[(MemoryType, f64)], epsilon: f64) -> Option<MemoryType> {
    let max_score = candidates
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::MIN, f64::max);

    let tied: Vec<MemoryType> = candidates
        .iter()
        .filter(|(_, s)| (max_score - s).abs() <= epsilon)
        .map(|(t, _)| *t)
        .collect();

    PRIORITY_ORDER.iter().find(|t| tied.contains(t)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_splits_on_sentence_boundaries() {
        let segments = segment_into_candidates("I prefer Rust. We chose Postgres for storage.");
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_segment_drops_trivial_fragments() {
        let segments = segment_into_candidates("Ok. I prefer dark mode.");
        assert_eq!(segments, vec!["I prefer dark mode"]);
    }

    #[test]
    fn test_resolve_tie_prefers_preference_over_semantic() {
        let candidates = vec![(MemoryType::Semantic, 0.7), (MemoryType::Preference, 0.7)];
        assert_eq!(resolve_tie(&candidates, 0.001), Some(MemoryType::Preference));
    }

    #[test]
    fn test_resolve_tie_prefers_procedural_over_episodic() {
        let candidates = vec![(MemoryType::Episodic, 0.8), (MemoryType::Procedural, 0.8)];
        assert_eq!(resolve_tie(&candidates, 0.001), Some(MemoryType::Procedural));
    }
}
