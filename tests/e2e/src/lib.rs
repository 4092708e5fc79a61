//! Shared harness for end-to-end tests: a disposable, temp-directory-backed
//! engine so each test gets an isolated SQLite file without hand-rolling
//! `TempDir` plumbing in every test function.

use std::path::PathBuf;
use std::time::Duration;

use kuzu_memory_core::{Engine, EngineConfig};
use tempfile::TempDir;

/// An [`Engine`] backed by a database file in a scratch directory that's
/// removed when this value drops.
pub struct TestEngine {
    pub engine: Engine,
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestEngine {
    /// Open a fresh engine with default tuning, on disk.
    pub fn open() -> Self {
        Self::with_config(|_| {})
    }

    /// Open a fresh engine, letting the caller adjust the default config
    /// first (recall deadline, queue sizing, confidence threshold, etc).
    pub fn with_config(adjust: impl FnOnce(&mut EngineConfig)) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir for test engine");
        let db_path = temp_dir.path().join("memory.db");

        let mut config = EngineConfig {
            db_path: Some(db_path.clone()),
            ..EngineConfig::default()
        };
        adjust(&mut config);

        let engine = Engine::open(config).expect("open test engine");

        Self {
            engine,
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Reopen a new `Engine` pointed at the same on-disk database and
    /// scratch directory, simulating a process restart.
    pub fn reopen(self) -> Self {
        let config = EngineConfig {
            db_path: Some(self.db_path.clone()),
            ..EngineConfig::default()
        };
        let engine = Engine::open(config).expect("reopen test engine");
        Self {
            engine,
            _temp_dir: self._temp_dir,
            db_path: self.db_path,
        }
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }
}

/// A short wall-clock budget tests can pass to `shutdown` without waiting
/// out the default deadline.
pub fn quick_deadline() -> Duration {
    Duration::from_millis(500)
}
