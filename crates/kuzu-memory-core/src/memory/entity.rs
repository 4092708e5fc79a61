//! Entities and entity mentions — the edges of the memory graph.

use serde::{Deserialize, Serialize};

/// A normalized noun-phrase/identifier extracted from memories (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    /// Case-folded canonical form.
    pub name: String,
    pub kind: EntityKind,
}

/// Coarse entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Project,
    Technology,
    Organization,
    Concept,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Project => "project",
            EntityKind::Technology => "technology",
            EntityKind::Organization => "organization",
            EntityKind::Concept => "concept",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate mention of an entity found in raw text, before it has been
/// resolved to an `Entity` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMention {
    /// Original surface form as it appeared in the text.
    pub surface_form: String,
    pub kind: EntityKind,
    /// Byte offset of the mention within the source text.
    pub offset: usize,
    /// Extraction confidence in [0, 1].
    pub confidence: f32,
}

impl EntityMention {
    /// The case-folded canonical name this mention resolves to.
    pub fn canonical_name(&self) -> String {
        self.surface_form.to_lowercase()
    }
}
