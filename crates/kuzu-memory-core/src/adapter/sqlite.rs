//! SQLite-backed graph adapter.
//!
//! The sole implementation of the graph-storage boundary (§4.1). Owns one
//! writer connection and one reader connection, each behind its own
//! [`Mutex`], so the adapter is `Send + Sync` while SQLite's single-writer
//! rule is still respected. Concurrent reads do not block on the writer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, Transaction};

use crate::error::{KuzuMemoryError, Result};

use super::migrations::apply_migrations;

/// A pooled SQLite-backed adapter, scoped to one project directory.
pub struct SqliteAdapter {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
    /// Kept alive only for shared in-memory databases: SQLite tears down a
    /// `cache=shared` in-memory database the instant its last connection
    /// closes, so this anchor connection outlives `writer`/`reader` to keep
    /// the database alive for as long as the adapter exists.
    _memory_anchor: Option<Mutex<Connection>>,
}

impl SqliteAdapter {
    /// Open (creating if absent) the database at `path`, apply pending
    /// migrations, and harden file permissions on Unix (§6: "the on-disk
    /// database is not world-readable").
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KuzuMemoryError::StoreUnavailable(e.to_string()))?;
            harden_dir_permissions(parent);
        }

        let writer = Connection::open(path)?;
        configure_connection(&writer)?;
        apply_migrations(&writer).map_err(|e| KuzuMemoryError::Corruption(e.to_string()))?;

        let reader = Connection::open(path)?;
        configure_connection(&reader)?;
        reader.execute_batch("PRAGMA query_only = ON;")?;

        harden_file_permissions(path);

        tracing::info!(path = %path.display(), "sqlite adapter opened");

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            path: path.to_path_buf(),
            _memory_anchor: None,
        })
    }

    /// Open a temporary in-memory database — used by tests and by callers
    /// who explicitly opt out of persistence.
    ///
    /// Plain `Connection::open_in_memory()` gives every connection its own
    /// private database, so a separate writer and reader connection would
    /// never see each other's data. Instead this opens a uniquely-named
    /// `cache=shared` URI so the writer and reader connections (and an
    /// anchor connection kept alive for the adapter's lifetime) share one
    /// in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let uri = format!(
            "file:kuzu-memory-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        // Opened first and never closed: a shared-cache in-memory database
        // is destroyed the moment its last connection closes, and without
        // this anchor that could race with the writer/reader being opened.
        let anchor = Connection::open_with_flags(&uri, flags)?;

        let writer = Connection::open_with_flags(&uri, flags)?;
        configure_connection(&writer)?;
        apply_migrations(&writer).map_err(|e| KuzuMemoryError::Corruption(e.to_string()))?;

        let reader = Connection::open_with_flags(&uri, flags)?;
        configure_connection(&reader)?;
        reader.execute_batch("PRAGMA query_only = ON;")?;

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            path: PathBuf::from(":memory:"),
            _memory_anchor: Some(Mutex::new(anchor)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the writer connection, holding the writer lock for
    /// the duration. The adapter's single gate to mutation (§4.1).
    pub fn with_writer<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .writer
            .lock()
            .map_err(|_| KuzuMemoryError::StoreUnavailable("writer lock poisoned".into()))?;
        f(&conn)
    }

    /// Run `f` against a read-only connection. Never blocks on writers.
    pub fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .reader
            .lock()
            .map_err(|_| KuzuMemoryError::StoreUnavailable("reader lock poisoned".into()))?;
        f(&conn)
    }

    /// Run `f` inside a write transaction, committing on `Ok` and rolling
    /// back on `Err` (§4.1: "all-or-nothing multi-statement writes").
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self
            .writer
            .lock()
            .map_err(|_| KuzuMemoryError::StoreUnavailable("writer lock poisoned".into()))?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Size of the backing database file in bytes, or 0 for in-memory.
    pub fn size_bytes(&self) -> i64 {
        std::fs::metadata(&self.path)
            .map(|m| m.len() as i64)
            .unwrap_or(0)
    }
}

/// Apply the pragma set the adapter relies on: WAL for reader/writer
/// concurrency, NORMAL sync (durable enough with WAL, far cheaper than
/// FULL), a busy timeout so concurrent access degrades to waiting rather
/// than `SQLITE_BUSY`, and foreign keys for cascade deletes.
fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA mmap_size = 268435456;",
    )?;
    Ok(())
}

#[cfg(unix)]
fn harden_dir_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(dir) {
        let mut perms = meta.permissions();
        perms.set_mode(0o700);
        let _ = std::fs::set_permissions(dir, perms);
    }
}

#[cfg(not(unix))]
fn harden_dir_permissions(_dir: &Path) {}

#[cfg(unix)]
fn harden_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mut perms = meta.permissions();
        perms.set_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn harden_file_permissions(_path: &Path) {}
