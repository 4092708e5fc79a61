//! Engine Facade (C9)
//!
//! The single entry point embedders use: `remember` and `learn` to get
//! knowledge in, `attach_memories` to get it back out as enhanced prompt
//! text, `stats`/`expire`/`shutdown` to operate the engine. Every other
//! module in this crate is reachable only through here.

use std::io::{BufRead, Write as _};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adapter::SqliteAdapter;
use crate::cache::RecallCache;
use crate::config::EngineConfig;
use crate::enhance::{Composer, EnhancementFormat};
use crate::error::{KuzuMemoryError, Result};
use crate::extraction::{EnhancedClassifier, Extractor, RuleClassifier, RuleExtractor};
use crate::memory::{EngineStats, Memory, MemoryContext, MemoryFilters, ScoredMemory};
use crate::queue::{AsyncLearningQueue, LearnTask};
use crate::recall::{RecallCoordinator, RecallQuery, StrategyChoice};
use crate::store::{MemoryStore, PutOutcome};

/// The embeddable memory engine. Wrap in an `Arc` to share across an
/// embedder's request handlers.
pub struct Engine {
    store: Arc<MemoryStore>,
    coordinator: RecallCoordinator,
    cache: Arc<RecallCache>,
    queue: Mutex<Option<AsyncLearningQueue>>,
    config: EngineConfig,
    extractor: Arc<dyn Extractor>,
}

impl Engine {
    /// Open (or create) the engine's store at `config.db_path`, spin up
    /// the learning-queue worker pool, and replay any tasks spilled by a
    /// previous graceful shutdown (§4.8, §4.9).
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let adapter = match &config.db_path {
            Some(path) => SqliteAdapter::open(path)?,
            None => SqliteAdapter::open_in_memory()?,
        };
        let store = Arc::new(MemoryStore::new(adapter));

        let coordinator = RecallCoordinator::new(store.clone(), config.recall_deadline, config.recall_weights());
        let cache = Arc::new(RecallCache::new(config.cache_capacity, config.cache_ttl));

        let extractor: Arc<dyn Extractor> = if config.extraction_enable_nlp_classification {
            Arc::new(RuleExtractor::with_classifier(EnhancedClassifier::default()))
        } else {
            Arc::new(RuleExtractor::<RuleClassifier>::default())
        };

        let handler_store = store.clone();
        let handler_cache = cache.clone();
        let handler_extractor = extractor.clone();
        let min_confidence = config.min_extraction_confidence;
        let handler_config = config.clone();
        let handler: crate::queue::TaskHandler = Arc::new(move |task: &LearnTask| {
            let mut any_inserted = false;
            for draft in handler_extractor.extract(&task.text) {
                if draft.confidence < min_confidence {
                    continue;
                }
                let memory = draft_to_memory(draft.clone(), task, &handler_config);
                if handler_store.put(memory, &draft.entities)?.is_inserted() {
                    any_inserted = true;
                }
            }
            if any_inserted {
                handler_cache.invalidate_all();
                enforce_storage_budget(&handler_store, &handler_config)?;
            }
            Ok(())
        });

        let queue = AsyncLearningQueue::spawn(config.queue_capacity, config.queue_workers, handler);

        let engine = Self {
            store,
            coordinator,
            cache,
            queue: Mutex::new(Some(queue)),
            config,
            extractor,
        };

        engine.replay_spilled_tasks();

        Ok(engine)
    }

    /// Immediately classify, extract entities from, and store `text`,
    /// bypassing the learning queue — for callers that need the stored
    /// memory back synchronously (§4.3, "remember" vs "learn").
    pub fn remember(&self, text: &str, filters: MemoryFilters) -> Result<Vec<PutOutcome>> {
        let mut stored = Vec::new();
        for draft in self.extractor.extract(text) {
            if draft.confidence < self.config.min_extraction_confidence {
                continue;
            }
            let now = Utc::now();
            let memory = Memory {
                id: String::new(),
                content: draft.content.clone(),
                content_hash: String::new(),
                memory_type: draft.memory_type,
                importance: draft.memory_type.default_importance(),
                confidence: draft.confidence,
                created_at: now,
                valid_from: now,
                valid_to: self.config.retention_ttl(draft.memory_type).map(|d| now + d),
                source: filters.source.clone(),
                session_id: filters.session_id.clone(),
                agent_id: filters.agent_id.clone(),
                metadata: Default::default(),
            };
            stored.push(self.store.put(memory, &draft.entities)?);
        }
        if stored.iter().any(PutOutcome::is_inserted) {
            self.cache.invalidate_all();
            enforce_storage_budget(&self.store, &self.config)?;
        }
        Ok(stored)
    }

    /// Enqueue `text` for background extraction and storage. Returns
    /// immediately; `false` means the queue was full and the task was
    /// dropped (§4.8).
    pub async fn learn(&self, task: LearnTask) -> Result<bool> {
        let queue = self.queue.lock().unwrap();
        match queue.as_ref() {
            Some(q) => Ok(q.enqueue(task)),
            None => Err(KuzuMemoryError::StoreUnavailable(
                "engine is shutting down".into(),
            )),
        }
    }

    /// Recall memories relevant to `prompt` and return it enhanced with
    /// them, serving from cache when possible (§4.7, §4.8, §4.9).
    ///
    /// `max`, `strategy`, and `format` all fall back to their
    /// configured defaults when `None` (§4.8 facade table).
    pub fn attach_memories(
        &self,
        prompt: &str,
        max: Option<usize>,
        strategy: Option<StrategyChoice>,
        filters: MemoryFilters,
        format: Option<EnhancementFormat>,
    ) -> Result<MemoryContext> {
        if prompt.trim().is_empty() {
            return Err(KuzuMemoryError::InvalidInput("prompt must not be empty".into()));
        }

        let started = std::time::Instant::now();
        let max = max.unwrap_or(self.config.recall_limit);
        let strategy = strategy.unwrap_or(self.config.recall_default_strategy);
        let format = format.unwrap_or(self.config.enhancement_default_format);
        let composer = Composer::new(format, self.config.enhancement_char_budget);

        let cache_key = RecallCache::key(prompt, max, strategy, &filters.fingerprint());

        if self.config.cache_enabled {
            if let Some((memories, degraded)) = self.cache.get(&cache_key) {
                return Ok(self.finish_context(prompt, memories, degraded, started, &composer));
            }
        }

        let query = RecallQuery::new(prompt)
            .with_filters(filters)
            .with_limit(max)
            .with_strategy(strategy);

        let outcome = match self.coordinator.recall(&query) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "recall failed, returning passthrough context");
                return Ok(MemoryContext::passthrough(prompt, true));
            }
        };

        let memories: Vec<ScoredMemory> = outcome.memories.into_iter().take(max).collect();

        if self.config.cache_enabled {
            self.cache.put(cache_key, memories.clone(), outcome.degraded);
        }

        Ok(self.finish_context(prompt, memories, outcome.degraded, started, &composer))
    }

    fn finish_context(
        &self,
        prompt: &str,
        memories: Vec<ScoredMemory>,
        degraded: bool,
        started: std::time::Instant,
        composer: &Composer,
    ) -> MemoryContext {
        let enhanced_prompt = composer.compose(prompt, &memories);
        MemoryContext {
            prompt: prompt.to_string(),
            enhanced_prompt,
            memories,
            took_ms: started.elapsed().as_millis() as u64,
            degraded,
            generated_at: Utc::now(),
        }
    }

    pub fn recent(&self, filters: &MemoryFilters, limit: usize) -> Result<Vec<Memory>> {
        self.store.get_recent(filters, limit)
    }

    pub fn stats(&self) -> Result<EngineStats> {
        let (oldest, newest) = self.store.oldest_and_newest()?;
        Ok(EngineStats {
            memory_count: self.store.count(&MemoryFilters::default())?,
            entity_count: self.store.entity_count()?,
            size_bytes: self.store.size_bytes(),
            oldest_memory: oldest,
            newest_memory: newest,
            queue_queued: self.queue_snapshot(|q| q.queued()),
            queue_running: self.queue_snapshot(|q| q.running()),
            queue_done: self.queue_snapshot(|q| q.done() as usize),
            queue_failed: self.queue_snapshot(|q| q.failed() as usize),
            queue_dropped: self.queue_snapshot(|q| q.dropped() as usize),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
        })
    }

    fn queue_snapshot(&self, f: impl Fn(&AsyncLearningQueue) -> usize) -> usize {
        self.queue
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(&f))
            .unwrap_or(0)
    }

    /// Hard-delete memories expired as of `before` and any entity left
    /// with no surviving mention, then invalidate the cache (§4.4).
    pub fn expire(&self, before: DateTime<Utc>) -> Result<usize> {
        let removed = self.store.expire(before)?;
        self.store.prune_orphan_entities()?;
        if removed > 0 {
            self.cache.invalidate_all();
        }
        Ok(removed)
    }

    /// Stop accepting new learning tasks, wait up to `deadline` (defaulting
    /// to `config.queue_drain_deadline`) for the queue to drain, and spill
    /// anything left to `config.spill_path` for replay on the next `open`
    /// (§4.8).
    pub async fn shutdown(&self, deadline: Option<Duration>) -> Result<()> {
        let deadline = deadline.unwrap_or(self.config.queue_drain_deadline);
        let queue = self.queue.lock().unwrap().take();
        let Some(queue) = queue else {
            return Ok(());
        };

        let pending = queue.shutdown(deadline).await;
        if pending.is_empty() {
            return Ok(());
        }

        let Some(spill_path) = &self.config.spill_path else {
            tracing::warn!(count = pending.len(), "dropping undrained tasks, no spill_path configured");
            return Ok(());
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(spill_path)
            .map_err(|e| KuzuMemoryError::StoreUnavailable(e.to_string()))?;

        for task in pending {
            let line = serde_json::to_string(&task).unwrap_or_default();
            writeln!(file, "{line}").map_err(|e| KuzuMemoryError::StoreUnavailable(e.to_string()))?;
        }

        Ok(())
    }

    fn replay_spilled_tasks(&self) {
        let Some(spill_path) = &self.config.spill_path else {
            return;
        };
        let Ok(file) = std::fs::File::open(spill_path) else {
            return;
        };

        let tasks: Vec<LearnTask> = std::io::BufReader::new(file)
            .lines()
            .map_while(|l| l.ok())
            .filter_map(|line| serde_json::from_str::<LearnTask>(&line).ok())
            .collect();

        if tasks.is_empty() {
            return;
        }

        tracing::info!(count = tasks.len(), "replaying spilled learning tasks");
        let _ = std::fs::remove_file(spill_path);

        if let Ok(guard) = self.queue.lock() {
            if let Some(queue) = guard.as_ref() {
                for task in tasks {
                    queue.enqueue(task);
                }
            }
        }
    }
}

/// Check the store against `config.storage_max_size_mb`, compacting first
/// if `storage_auto_compact` is set, and failing if it's still over
/// budget afterward (§6 `storage.max_size_mb`/`storage.auto_compact`).
fn enforce_storage_budget(store: &MemoryStore, config: &EngineConfig) -> Result<()> {
    let Some(max_mb) = config.storage_max_size_mb else {
        return Ok(());
    };
    let max_bytes = (max_mb as i64) * 1024 * 1024;

    if store.size_bytes() <= max_bytes {
        return Ok(());
    }

    if config.storage_auto_compact {
        store.compact()?;
    }

    if store.size_bytes() > max_bytes {
        return Err(KuzuMemoryError::StoreUnavailable(format!(
            "database exceeds configured storage.max_size_mb ({max_mb} MB)"
        )));
    }
    Ok(())
}

fn draft_to_memory(draft: crate::extraction::MemoryDraft, task: &LearnTask, config: &EngineConfig) -> Memory {
    let now = Utc::now();
    Memory {
        id: String::new(),
        content: draft.content,
        content_hash: String::new(),
        memory_type: draft.memory_type,
        importance: draft.memory_type.default_importance(),
        confidence: draft.confidence,
        created_at: now,
        valid_from: now,
        valid_to: config.retention_ttl(draft.memory_type).map(|d| now + d),
        source: task.source.clone(),
        session_id: task.session_id.clone(),
        agent_id: task.agent_id.clone(),
        metadata: Default::default(),
    }
}
