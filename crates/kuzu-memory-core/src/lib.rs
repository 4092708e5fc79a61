//! KuzuMemory: an embedded, project-scoped memory engine for AI
//! assistants.
//!
//! Classifies, stores, and recalls contextual knowledge from
//! conversations without calling out to an LLM. Everything lives in a
//! single SQLite file per project; there is no server, no network
//! client, and no model to download. Embedders drive the engine through
//! [`Engine`]: [`Engine::remember`]/[`Engine::learn`] to store knowledge,
//! [`Engine::attach_memories`] to recall it back into a prompt.
//!
//! ```no_run
//! use kuzu_memory_core::{Engine, EngineConfig, MemoryFilters};
//!
//! # fn main() -> kuzu_memory_core::Result<()> {
//! let engine = Engine::open(EngineConfig::default())?;
//! engine.remember("I prefer dark mode", MemoryFilters::default())?;
//! let context = engine.attach_memories(
//!     "what theme should I use?",
//!     None,
//!     None,
//!     MemoryFilters::default(),
//!     None,
//! )?;
//! println!("{}", context.enhanced_prompt);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod enhance;
mod engine;
pub mod error;
pub mod extraction;
pub mod memory;
pub mod queue;
pub mod recall;
pub mod store;

pub use config::EngineConfig;
pub use engine::Engine;
pub use enhance::EnhancementFormat;
pub use error::{KuzuMemoryError, Result};
pub use memory::{EngineStats, Memory, MemoryContext, MemoryFilters, MemoryType, ScoredMemory};
pub use queue::LearnTask;
pub use recall::StrategyChoice;
pub use store::PutOutcome;
