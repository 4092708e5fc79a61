//! Graph Adapter (C1)
//!
//! The only component that speaks SQL against the on-disk store. Every
//! other component reaches the database exclusively through
//! [`SqliteAdapter`]'s typed methods — no other module imports `rusqlite`
//! directly (§4.1).

mod migrations;
mod sqlite;

pub use sqlite::SqliteAdapter;
