//! Error Types
//!
//! A single canonical error enum for the engine, matching the taxonomy
//! every component is documented to surface.

use thiserror::Error;

/// Engine-wide error type.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KuzuMemoryError {
    /// Caller-supplied value violates a documented limit (content/source
    /// length, empty prompt, etc).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O, lock acquisition failure, or disk exhaustion on the graph
    /// adapter.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// On-disk schema/integrity violation; requires operator intervention.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// Async enqueue rejected after the drop-policy fallback still left no
    /// room.
    #[error("learning queue is full")]
    QueueFull,

    /// Surfaced only when a caller-provided deadline fires; the default
    /// recall path degrades to partial results instead of returning this.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// Unknown option or out-of-range value at engine construction.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Underlying SQLite failure that didn't map to a more specific
    /// variant above.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, KuzuMemoryError>;
