//! Lightweight named-entity recognition.
//!
//! No model, no external service: a technology glossary for word-boundary
//! matches plus a capitalized-run detector for proper nouns the glossary
//! doesn't know about. Good enough to drive entity-based recall (§4.5);
//! not a general-purpose NER system.

use crate::memory::{EntityKind, EntityMention};

const TECH_TERMS: &[&str] = &[
    "rust", "python", "typescript", "javascript", "golang", "java", "kotlin", "swift", "ruby",
    "postgresql", "postgres", "mysql", "sqlite", "redis", "mongodb", "kafka", "rabbitmq",
    "docker", "kubernetes", "terraform", "ansible", "aws", "gcp", "azure", "react", "vue",
    "angular", "svelte", "nextjs", "django", "flask", "fastapi", "actix", "axum", "tokio",
    "graphql", "grpc", "rest", "websocket", "git", "github", "gitlab", "ci", "cd", "linux",
    "nginx", "webpack", "vite", "cargo", "npm", "yarn", "pytest", "jest",
];

const STOP_WORDS: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "I", "We", "You", "It", "They",
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const NAME_CONNECTORS: &[&str] = &["de", "van", "von", "der", "la", "del"];

/// Extract candidate entity mentions from free text.
pub fn extract_entity_mentions(text: &str) -> Vec<EntityMention> {
    let mut mentions = extract_technology_terms(text);
    mentions.extend(extract_capitalized_runs(text));
    deduplicate_mentions(mentions)
}

fn extract_technology_terms(text: &str) -> Vec<EntityMention> {
    let lower = text.to_lowercase();
    let mut mentions = Vec::new();

    for term in TECH_TERMS {
        let mut search_from = 0;
        while let Some(rel_offset) = lower[search_from..].find(term) {
            let offset = search_from + rel_offset;
            let end = offset + term.len();
            if is_word_boundary(&lower, offset, end) {
                mentions.push(EntityMention {
                    surface_form: text[offset..end].to_string(),
                    kind: EntityKind::Technology,
                    offset,
                    confidence: 0.85,
                });
            }
            search_from = end;
        }
    }

    mentions
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || !text[..start]
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric());
    let after_ok = end == text.len()
        || !text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
    before_ok && after_ok
}

/// Runs of two or more consecutive capitalized words, e.g. "Project
/// Falcon" or "Marie Curie" — treated as `Concept` unless the run looks
/// like a personal name (two title-case words with no glossary hit).
fn extract_capitalized_runs(text: &str) -> Vec<EntityMention> {
    let mut mentions = Vec::new();
    let words: Vec<(usize, &str)> = text
        .split_whitespace()
        .map(|w| {
            let offset = w.as_ptr() as usize - text.as_ptr() as usize;
            (offset, w.trim_matches(|c: char| !c.is_alphanumeric()))
        })
        .filter(|(_, w)| !w.is_empty())
        .collect();

    let mut i = 0;
    while i < words.len() {
        let (offset, word) = words[i];
        if is_title_case(word) && !STOP_WORDS.contains(&word) {
            let mut run_end = i + 1;
            while run_end < words.len() {
                let (_, next_word) = words[run_end];
                let connector = NAME_CONNECTORS.contains(&next_word.to_lowercase().as_str());
                if (is_title_case(next_word) && !STOP_WORDS.contains(&next_word)) || connector {
                    run_end += 1;
                } else {
                    break;
                }
            }

            if run_end > i + 1 {
                let (last_offset, last_word) = words[run_end - 1];
                let end = last_offset + last_word.len();
                let surface_form = text[offset..end].to_string();
                let kind = if run_end - i == 2 {
                    EntityKind::Person
                } else {
                    EntityKind::Concept
                };
                mentions.push(EntityMention {
                    surface_form,
                    kind,
                    offset,
                    confidence: 0.6,
                });
                i = run_end;
                continue;
            }
        }
        i += 1;
    }

    mentions
}

fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => chars.any(|c| c.is_lowercase()),
        _ => false,
    }
}

/// Drop mentions whose span is fully contained in a longer one, preferring
/// the longer, higher-confidence candidate.
fn deduplicate_mentions(mut mentions: Vec<EntityMention>) -> Vec<EntityMention> {
    mentions.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then(b.surface_form.len().cmp(&a.surface_form.len()))
    });

    let mut kept: Vec<EntityMention> = Vec::new();
    for mention in mentions {
        let end = mention.offset + mention.surface_form.len();
        let overlaps = kept.iter().any(|k| {
            let k_end = k.offset + k.surface_form.len();
            mention.offset < k_end && end > k.offset
        });
        if !overlaps {
            kept.push(mention);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_technology_terms() {
        let mentions = extract_entity_mentions("We migrated the service from MySQL to PostgreSQL");
        assert!(mentions.iter().any(|m| m.surface_form.eq_ignore_ascii_case("mysql")));
        assert!(mentions.iter().any(|m| m.surface_form.eq_ignore_ascii_case("postgresql")));
    }

    #[test]
    fn test_extracts_capitalized_run_as_concept() {
        let mentions = extract_entity_mentions("The launch is called Project Falcon");
        assert!(mentions
            .iter()
            .any(|m| m.surface_form == "Project Falcon" && m.kind == EntityKind::Concept));
    }

    #[test]
    fn test_two_word_run_treated_as_person() {
        let mentions = extract_entity_mentions("Marie Curie discovered radium");
        assert!(mentions
            .iter()
            .any(|m| m.surface_form == "Marie Curie" && m.kind == EntityKind::Person));
    }

    #[test]
    fn test_stop_words_not_treated_as_entities() {
        let mentions = extract_entity_mentions("The Monday meeting was moved");
        assert!(mentions.is_empty());
    }

    #[test]
    fn test_deduplicate_prefers_longer_span() {
        let mentions = extract_entity_mentions("We love Rust and also use Rust async");
        let rust_mentions: Vec<_> = mentions
            .iter()
            .filter(|m| m.surface_form.eq_ignore_ascii_case("rust"))
            .collect();
        assert_eq!(rust_mentions.len(), 2);
    }
}
