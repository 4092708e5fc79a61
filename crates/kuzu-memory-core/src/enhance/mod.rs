//! Enhancement Composer (C7)
//!
//! Renders recalled memories into text that gets prepended to a prompt.
//! Three formats trade off how much structure the receiving model gets
//! versus how many characters it costs; all three respect a hard
//! character budget so enhancement never drowns out the original prompt.

use serde::{Deserialize, Serialize};

use crate::memory::ScoredMemory;

/// How composed context is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementFormat {
    /// Bare sentences, one per line.
    Plain,
    /// Markdown-ish block with a header, used when the receiving prompt
    /// already reads as structured text.
    #[default]
    Context,
    /// A JSON array of `{id, content, type, score}` objects, for callers
    /// that parse the result programmatically instead of just splicing
    /// text.
    Json,
}

/// Composes an enhanced prompt from a prompt and its recalled memories
/// (§4.7).
pub struct Composer {
    pub format: EnhancementFormat,
    pub char_budget: usize,
}

impl Composer {
    pub fn new(format: EnhancementFormat, char_budget: usize) -> Self {
        Self { format, char_budget }
    }

    /// Build the enhanced prompt. Memories are taken highest-score-first
    /// until the budget would be exceeded; a memory that doesn't fit is
    /// skipped, not truncated mid-sentence, so every included memory
    /// reads as a complete thought (§4.7).
    pub fn compose(&self, prompt: &str, memories: &[ScoredMemory]) -> String {
        if memories.is_empty() {
            return prompt.to_string();
        }

        let block = match self.format {
            EnhancementFormat::Plain => self.render_plain(memories),
            EnhancementFormat::Context => self.render_context(memories),
            EnhancementFormat::Json => self.render_json(memories),
        };

        if block.is_empty() {
            return prompt.to_string();
        }

        format!("{block}\n\n{prompt}")
    }

    fn render_plain(&self, memories: &[ScoredMemory]) -> String {
        let mut out = String::new();
        for m in memories {
            let line = format!("- {}", m.memory.content);
            if out.len() + line.len() + 1 > self.char_budget {
                break;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&line);
        }
        out
    }

    fn render_context(&self, memories: &[ScoredMemory]) -> String {
        let header = "## Relevant context\n";
        let mut out = String::from(header);
        for m in memories {
            let line = format!("- ({}) {}\n", m.memory.memory_type, m.memory.content);
            if out.len() + line.len() > self.char_budget {
                break;
            }
            out.push_str(&line);
        }
        if out.trim() == header.trim() {
            return String::new();
        }
        out.trim_end().to_string()
    }

    fn render_json(&self, memories: &[ScoredMemory]) -> String {
        let mut entries = Vec::new();
        let mut running_len = 2; // "[]"
        for m in memories {
            let entry = serde_json::json!({
                "id": m.memory.id,
                "content": m.memory.content,
                "type": m.memory.memory_type.as_str(),
                "score": m.score,
            });
            let entry_str = entry.to_string();
            if running_len + entry_str.len() + 1 > self.char_budget {
                break;
            }
            running_len += entry_str.len() + 1;
            entries.push(entry);
        }
        if entries.is_empty() {
            return String::new();
        }
        serde_json::Value::Array(entries).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Memory, MemoryType, StrategyKind};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn scored(content: &str, score: f64) -> ScoredMemory {
        let now = Utc::now();
        ScoredMemory {
            memory: Memory {
                id: "1".into(),
                content: content.into(),
                content_hash: "h".into(),
                memory_type: MemoryType::Semantic,
                importance: 1.0,
                confidence: 0.9,
                created_at: now,
                valid_from: now,
                valid_to: None,
                source: None,
                session_id: None,
                agent_id: None,
                metadata: BTreeMap::new(),
            },
            score,
            matched_by: vec![StrategyKind::Keyword],
        }
    }

    #[test]
    fn test_plain_format_lists_memories() {
        let composer = Composer::new(EnhancementFormat::Plain, 1_000);
        let out = composer.compose("what should I use?", &[scored("we use Rust", 0.9)]);
        assert!(out.contains("- we use Rust"));
        assert!(out.ends_with("what should I use?"));
    }

    #[test]
    fn test_empty_memories_returns_prompt_unchanged() {
        let composer = Composer::new(EnhancementFormat::Context, 1_000);
        assert_eq!(composer.compose("hello", &[]), "hello");
    }

    #[test]
    fn test_budget_excludes_memories_that_overflow() {
        let composer = Composer::new(EnhancementFormat::Plain, 10);
        let out = composer.compose("prompt", &[scored("a very long memory that will not fit", 0.9)]);
        assert_eq!(out, "prompt");
    }

    #[test]
    fn test_json_format_is_valid_json() {
        let composer = Composer::new(EnhancementFormat::Json, 1_000);
        let out = composer.compose("prompt", &[scored("we use Rust", 0.9)]);
        let (json_part, _) = out.split_once("\n\n").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(json_part).unwrap();
        assert!(parsed.is_array());
    }
}
