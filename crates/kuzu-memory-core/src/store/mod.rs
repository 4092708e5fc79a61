//! Memory Store (C2)
//!
//! Durable persistence and scoped queries over [`Memory`] rows, entities,
//! and the mentions linking them. Built entirely on top of
//! [`SqliteAdapter`] — this module owns the schema's meaning (what a row
//! is), the adapter owns how it is physically read and written.

mod fts;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::adapter::SqliteAdapter;
use crate::error::{KuzuMemoryError, Result};
use crate::memory::{
    content_hash, normalize_content, Entity, EntityKind, EntityMention, Memory, MemoryFilters,
    MemoryType, MetaValue, MAX_CONTENT_CHARS, MAX_SOURCE_CHARS,
};

pub use fts::sanitize_fts5_query;

/// Durable store over one project's memory graph (§4.2).
pub struct MemoryStore {
    adapter: SqliteAdapter,
}

/// Result of [`MemoryStore::put`]: whether the call wrote a new row or
/// matched an existing one by content hash (I1). A duplicate call performs
/// no write at all — the existing row is returned untouched.
#[derive(Debug, Clone)]
pub enum PutOutcome {
    Inserted(Memory),
    Duplicate(Memory),
}

impl PutOutcome {
    pub fn memory(&self) -> &Memory {
        match self {
            PutOutcome::Inserted(m) | PutOutcome::Duplicate(m) => m,
        }
    }

    pub fn into_memory(self) -> Memory {
        match self {
            PutOutcome::Inserted(m) | PutOutcome::Duplicate(m) => m,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, PutOutcome::Inserted(_))
    }
}

impl MemoryStore {
    pub fn new(adapter: SqliteAdapter) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &SqliteAdapter {
        &self.adapter
    }

    /// Insert a memory, deduplicating by normalized content hash against
    /// any still-valid memory of the same type and scope (I1). On a
    /// collision, nothing is written — the existing row is returned as-is
    /// via [`PutOutcome::Duplicate`] (§4.2, §8 scenario 2).
    pub fn put(&self, mut memory: Memory, mentions: &[EntityMention]) -> Result<PutOutcome> {
        if memory.content.trim().is_empty() {
            return Err(KuzuMemoryError::InvalidInput("content must not be empty".into()));
        }
        if memory.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(KuzuMemoryError::InvalidInput(format!(
                "content exceeds {MAX_CONTENT_CHARS} characters"
            )));
        }
        if let Some(source) = &memory.source {
            if source.chars().count() > MAX_SOURCE_CHARS {
                return Err(KuzuMemoryError::InvalidInput(format!(
                    "source exceeds {MAX_SOURCE_CHARS} characters"
                )));
            }
        }

        let normalized = normalize_content(&memory.content, memory.memory_type);
        memory.content_hash = content_hash(&normalized);

        validate_metadata_size(&memory.metadata)?;

        self.adapter.transaction(|tx| {
            let existing_id: Option<String> = tx
                .query_row(
                    "SELECT id FROM memories
                     WHERE content_hash = ?1 AND memory_type = ?2
                       AND (agent_id IS ?3) AND (session_id IS ?4)
                       AND (valid_to IS NULL OR valid_to > ?5)",
                    params![
                        memory.content_hash,
                        memory.memory_type.as_str(),
                        memory.agent_id,
                        memory.session_id,
                        Utc::now().to_rfc3339(),
                    ],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing_id {
                let existing = row_by_id(tx, &id)?.ok_or_else(|| {
                    KuzuMemoryError::Corruption(format!("memory {id} vanished mid-transaction"))
                })?;
                return Ok(PutOutcome::Duplicate(existing));
            }

            if memory.id.is_empty() {
                memory.id = Uuid::new_v4().to_string();
            }

            tx.execute(
                "INSERT INTO memories
                 (id, content, content_hash, memory_type, importance, confidence,
                  created_at, valid_from, valid_to, source, session_id, agent_id, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    memory.id,
                    memory.content,
                    memory.content_hash,
                    memory.memory_type.as_str(),
                    memory.importance,
                    memory.confidence,
                    memory.created_at.to_rfc3339(),
                    memory.valid_from.to_rfc3339(),
                    memory.valid_to.map(|t| t.to_rfc3339()),
                    memory.source,
                    memory.session_id,
                    memory.agent_id,
                    serde_json::to_string(&memory.metadata).unwrap_or_else(|_| "{}".into()),
                ],
            )?;

            for mention in mentions {
                let entity_id = upsert_entity(tx, &mention.canonical_name(), mention.kind)?;
                tx.execute(
                    "INSERT OR IGNORE INTO entity_mentions (memory_id, entity_id) VALUES (?1, ?2)",
                    params![memory.id, entity_id],
                )?;
            }

            Ok(PutOutcome::Inserted(memory.clone()))
        })
    }

    /// Reclaim space freed by `expire`/`prune_orphan_entities` (§6
    /// `storage.auto_compact`). No-op for in-memory databases.
    pub fn compact(&self) -> Result<()> {
        self.adapter.with_writer(|conn| {
            conn.execute_batch("VACUUM;")?;
            Ok(())
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Memory>> {
        self.adapter.with_reader(|conn| row_by_id(conn, id))
    }

    /// Most recently created memories matching `filters`, newest first.
    pub fn get_recent(&self, filters: &MemoryFilters, limit: usize) -> Result<Vec<Memory>> {
        self.adapter.with_reader(|conn| {
            let (clause, mut bind) = filters_clause(filters);
            bind.push(limit.to_string());
            let sql = format!(
                "SELECT {COLUMNS} FROM memories WHERE 1=1 {clause} AND (valid_to IS NULL OR valid_to > ?)
                 ORDER BY created_at DESC LIMIT ?"
            );
            // the unconditional expiry check needs `now`; inserted ahead of the limit bind
            let mut params_vec: Vec<String> = bind;
            params_vec.insert(params_vec.len() - 1, Utc::now().to_rfc3339());
            query_memories(conn, &sql, &params_vec)
        })
    }

    /// Keyword search via the FTS5 index, newest-ranked-first within ties.
    pub fn search_by_keywords(
        &self,
        query: &str,
        filters: &MemoryFilters,
        limit: usize,
    ) -> Result<Vec<(Memory, f64)>> {
        let Some(match_expr) = sanitize_fts5_query(query) else {
            return Ok(Vec::new());
        };

        self.adapter.with_reader(|conn| {
            let (clause, mut bind) = filters_clause(filters);
            let sql = format!(
                "SELECT m.{cols_prefixed}, bm25(memories_fts) AS rank
                 FROM memories_fts
                 JOIN memories m ON m.rowid = memories_fts.rowid
                 WHERE memories_fts MATCH ?1 {clause}
                   AND (m.valid_to IS NULL OR m.valid_to > ?2)
                 ORDER BY rank LIMIT ?3",
                cols_prefixed = COLUMNS
                    .split(", ")
                    .map(|c| format!("m.{c}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );

            let mut stmt = conn.prepare(&sql)?;
            let now = Utc::now().to_rfc3339();

            let mut values: Vec<String> = vec![match_expr, now];
            values.append(&mut bind);
            values.push(limit.to_string());
            let all_params: Vec<&dyn rusqlite::ToSql> =
                values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

            let rows = stmt.query_map(all_params.as_slice(), |row| {
                let memory = memory_from_row(row)?;
                // bm25 is negative-is-better; fold into a 0..1-ish score.
                let rank: f64 = row.get("rank")?;
                Ok((memory, 1.0 / (1.0 + rank.abs())))
            })?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    /// Memories linked to any of `entity_names` (case-folded), most
    /// mentions-in-common first.
    pub fn search_by_entities(
        &self,
        entity_names: &[String],
        filters: &MemoryFilters,
        limit: usize,
    ) -> Result<Vec<(Memory, f64)>> {
        if entity_names.is_empty() {
            return Ok(Vec::new());
        }

        self.adapter.with_reader(|conn| {
            let placeholders = entity_names.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let (clause, mut bind) = filters_clause(filters);
            let sql = format!(
                "SELECT m.{cols_prefixed}, COUNT(DISTINCT em.entity_id) AS hits
                 FROM memories m
                 JOIN entity_mentions em ON em.memory_id = m.id
                 JOIN entities e ON e.id = em.entity_id
                 WHERE e.name IN ({placeholders}) {clause}
                   AND (m.valid_to IS NULL OR m.valid_to > ?)
                 GROUP BY m.id
                 ORDER BY hits DESC, m.created_at DESC
                 LIMIT ?",
                cols_prefixed = COLUMNS
                    .split(", ")
                    .map(|c| format!("m.{c}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );

            let mut stmt = conn.prepare(&sql)?;
            let now = Utc::now().to_rfc3339();

            let mut values: Vec<String> = entity_names.to_vec();
            values.append(&mut bind);
            values.push(now);
            values.push(limit.to_string());
            let all_params: Vec<&dyn rusqlite::ToSql> =
                values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

            let rows = stmt.query_map(all_params.as_slice(), |row| {
                let memory = memory_from_row(row)?;
                let hits: i64 = row.get("hits")?;
                Ok((memory, hits as f64))
            })?;

            let max_hits = entity_names.len() as f64;
            let mut out = Vec::new();
            for r in rows {
                let (memory, hits) = r?;
                out.push((memory, (hits / max_hits.max(1.0)).min(1.0)));
            }
            Ok(out)
        })
    }

    /// Memories whose `created_at` falls within `[from, to]`, scored by
    /// exponential recency decay relative to `now` (§4.5, temporal
    /// strategy).
    pub fn search_by_time(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filters: &MemoryFilters,
        limit: usize,
    ) -> Result<Vec<(Memory, f64)>> {
        self.adapter.with_reader(|conn| {
            let (clause, mut bind) = filters_clause(filters);
            let sql = format!(
                "SELECT {COLUMNS} FROM memories
                 WHERE created_at >= ? AND created_at <= ? {clause}
                   AND (valid_to IS NULL OR valid_to > ?)
                 ORDER BY created_at DESC LIMIT ?"
            );
            let now = Utc::now();
            let mut params_vec = vec![from.to_rfc3339(), to.to_rfc3339()];
            params_vec.append(&mut bind);
            params_vec.push(now.to_rfc3339());
            params_vec.push(limit.to_string());

            let memories = query_memories(conn, &sql, &params_vec)?;
            Ok(memories
                .into_iter()
                .map(|m| {
                    let score = recency_score(m.created_at, now, m.memory_type.half_life());
                    (m, score)
                })
                .collect())
        })
    }

    pub fn count(&self, filters: &MemoryFilters) -> Result<i64> {
        self.adapter.with_reader(|conn| {
            let (clause, bind) = filters_clause(filters);
            let sql = format!(
                "SELECT COUNT(*) FROM memories WHERE 1=1 {clause} AND (valid_to IS NULL OR valid_to > ?)"
            );
            let mut params_vec = bind;
            params_vec.push(Utc::now().to_rfc3339());
            let params_ref: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
            conn.query_row(&sql, params_ref.as_slice(), |row| row.get(0))
                .map_err(KuzuMemoryError::from)
        })
    }

    pub fn entity_count(&self) -> Result<i64> {
        self.adapter
            .with_reader(|conn| conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0)).map_err(Into::into))
    }

    pub fn size_bytes(&self) -> i64 {
        self.adapter.size_bytes()
    }

    pub fn oldest_and_newest(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        self.adapter.with_reader(|conn| {
            let oldest: Option<String> = conn
                .query_row("SELECT MIN(created_at) FROM memories", [], |row| row.get(0))
                .optional()?
                .flatten();
            let newest: Option<String> = conn
                .query_row("SELECT MAX(created_at) FROM memories", [], |row| row.get(0))
                .optional()?
                .flatten();
            Ok((parse_ts_opt(oldest), parse_ts_opt(newest)))
        })
    }

    /// Mark memories whose `valid_to` has passed as expired — a no-op at
    /// the data level (expiry is a computed predicate, I4), but this is
    /// where eventual hard deletion happens during compaction.
    pub fn expire(&self, before: DateTime<Utc>) -> Result<usize> {
        self.adapter.with_writer(|conn| {
            let affected = conn.execute(
                "DELETE FROM memories WHERE valid_to IS NOT NULL AND valid_to < ?1",
                params![before.to_rfc3339()],
            )?;
            Ok(affected)
        })
    }

    /// Remove entities left with no surviving mentions — run after
    /// `expire` during compaction, never inline with recall.
    pub fn prune_orphan_entities(&self) -> Result<usize> {
        self.adapter.with_writer(|conn| {
            let affected = conn.execute(
                "DELETE FROM entities WHERE id NOT IN (SELECT DISTINCT entity_id FROM entity_mentions)",
                [],
            )?;
            Ok(affected)
        })
    }
}

const COLUMNS: &str = "id, content, content_hash, memory_type, importance, confidence, \
    created_at, valid_from, valid_to, source, session_id, agent_id, metadata";

fn upsert_entity(tx: &rusqlite::Transaction, name: &str, kind: EntityKind) -> Result<String> {
    let existing: Option<String> = tx
        .query_row("SELECT id FROM entities WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO entities (id, name, kind) VALUES (?1, ?2, ?3)",
        params![id, name, kind.as_str()],
    )?;
    Ok(id)
}

fn row_by_id(conn: &rusqlite::Connection, id: &str) -> Result<Option<Memory>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM memories WHERE id = ?1"),
        params![id],
        |row| memory_from_row(row),
    )
    .optional()
    .map_err(Into::into)
}

fn query_memories(conn: &rusqlite::Connection, sql: &str, params: &[String]) -> Result<Vec<Memory>> {
    let mut stmt = conn.prepare(sql)?;
    let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
    let rows = stmt.query_map(params_ref.as_slice(), |row| memory_from_row(row))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn memory_from_row(row: &Row) -> rusqlite::Result<Memory> {
    let memory_type_str: String = row.get("memory_type")?;
    let valid_to_str: Option<String> = row.get("valid_to")?;
    let metadata_str: String = row.get("metadata")?;
    let created_at: String = row.get("created_at")?;
    let valid_from: String = row.get("valid_from")?;

    Ok(Memory {
        id: row.get("id")?,
        content: row.get("content")?,
        content_hash: row.get("content_hash")?,
        memory_type: MemoryType::parse_name(&memory_type_str),
        importance: row.get("importance")?,
        confidence: row.get("confidence")?,
        created_at: parse_ts(&created_at),
        valid_from: parse_ts(&valid_from),
        valid_to: valid_to_str.map(|s| parse_ts(&s)),
        source: row.get("source")?,
        session_id: row.get("session_id")?,
        agent_id: row.get("agent_id")?,
        metadata: serde_json::from_str::<BTreeMap<String, MetaValue>>(&metadata_str).unwrap_or_default(),
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_ts_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_ts(&s))
}

/// Build a `filters`-derived SQL fragment plus its bound values, in the
/// order the fragment references them. Absent filters contribute nothing
/// (§4.5 step 4 — filters only ever narrow, never implicitly scope).
fn filters_clause(filters: &MemoryFilters) -> (String, Vec<String>) {
    let mut clause = String::new();
    let mut bind = Vec::new();

    if let Some(agent_id) = &filters.agent_id {
        clause.push_str(" AND agent_id = ?");
        bind.push(agent_id.clone());
    }
    if let Some(session_id) = &filters.session_id {
        clause.push_str(" AND session_id = ?");
        bind.push(session_id.clone());
    }
    if let Some(source) = &filters.source {
        clause.push_str(" AND source = ?");
        bind.push(source.clone());
    }
    if let Some(memory_type) = filters.memory_type {
        clause.push_str(" AND memory_type = ?");
        bind.push(memory_type.as_str().to_string());
    }

    (clause, bind)
}

fn validate_metadata_size(metadata: &BTreeMap<String, MetaValue>) -> Result<()> {
    let encoded = serde_json::to_string(metadata).unwrap_or_default();
    if encoded.len() > crate::memory::MAX_METADATA_BYTES {
        return Err(KuzuMemoryError::InvalidInput(format!(
            "metadata exceeds {} bytes",
            crate::memory::MAX_METADATA_BYTES
        )));
    }
    Ok(())
}

/// Exponential recency decay: `exp(-age / half_life)`, 1.0 at age zero,
/// asymptoting to zero (§4.5 temporal strategy).
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>, half_life: chrono::Duration) -> f64 {
    let age_secs = (now - created_at).num_seconds().max(0) as f64;
    let half_life_secs = half_life.num_seconds().max(1) as f64;
    (-age_secs / half_life_secs * std::f64::consts::LN_2).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn new_memory(content: &str, memory_type: MemoryType) -> Memory {
        let now = Utc::now();
        Memory {
            id: String::new(),
            content: content.to_string(),
            content_hash: String::new(),
            memory_type,
            importance: memory_type.default_importance(),
            confidence: 0.9,
            created_at: now,
            valid_from: now,
            valid_to: memory_type.default_retention().map(|d| now + d),
            source: None,
            session_id: None,
            agent_id: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_put_and_get_round_trip() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let stored = store
            .put(new_memory("we use Rust", MemoryType::Semantic), &[])
            .unwrap()
            .into_memory();
        let fetched = store.get(&stored.id).unwrap().unwrap();
        assert_eq!(fetched.content, "we use Rust");
    }

    #[test]
    fn test_put_deduplicates_by_content_hash() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let first = store.put(new_memory("I prefer dark mode", MemoryType::Preference), &[]).unwrap();
        assert!(first.is_inserted());
        let second = store
            .put(new_memory("I   prefer   dark mode", MemoryType::Preference), &[])
            .unwrap();
        assert!(!second.is_inserted());
        assert_eq!(first.memory().id, second.memory().id);
        assert_eq!(store.count(&MemoryFilters::default()).unwrap(), 1);
    }

    #[test]
    fn test_put_rejects_empty_content() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let err = store.put(new_memory("   ", MemoryType::Semantic), &[]).unwrap_err();
        assert!(matches!(err, KuzuMemoryError::InvalidInput(_)));
    }

    #[test]
    fn test_put_rejects_oversized_content() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let oversized = "a".repeat(MAX_CONTENT_CHARS + 1);
        let err = store.put(new_memory(&oversized, MemoryType::Semantic), &[]).unwrap_err();
        assert!(matches!(err, KuzuMemoryError::InvalidInput(_)));

        let exact = "a".repeat(MAX_CONTENT_CHARS);
        assert!(store.put(new_memory(&exact, MemoryType::Semantic), &[]).is_ok());
    }

    #[test]
    fn test_search_by_keywords_finds_match() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        store.put(new_memory("the team chose PostgreSQL for storage", MemoryType::Semantic), &[]).unwrap();
        store.put(new_memory("unrelated content about cats", MemoryType::Semantic), &[]).unwrap();

        let results = store
            .search_by_keywords("postgresql", &MemoryFilters::default(), 10)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].0.content.contains("PostgreSQL"));
    }

    #[test]
    fn test_search_by_entities_ranks_by_overlap() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let mention = EntityMention {
            surface_form: "Rust".into(),
            kind: EntityKind::Technology,
            offset: 0,
            confidence: 0.9,
        };
        store.put(new_memory("we use Rust", MemoryType::Semantic), std::slice::from_ref(&mention)).unwrap();

        let results = store
            .search_by_entities(&["rust".to_string()], &MemoryFilters::default(), 10)
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_expire_removes_past_valid_to() {
        let store = MemoryStore::new(SqliteAdapter::open_in_memory().unwrap());
        let mut m = new_memory("short lived", MemoryType::Sensory);
        m.valid_to = Some(Utc::now() - chrono::Duration::seconds(1));
        store.put(m, &[]).unwrap();

        let removed = store.expire(Utc::now()).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count(&MemoryFilters::default()).unwrap(), 0);
    }

    #[test]
    fn test_recency_score_decays_with_age() {
        let now = Utc::now();
        let half_life = chrono::Duration::days(7);
        let fresh = recency_score(now, now, half_life);
        let old = recency_score(now - chrono::Duration::days(7), now, half_life);
        assert!((fresh - 1.0).abs() < 1e-9);
        assert!((old - 0.5).abs() < 0.01);
    }
}
