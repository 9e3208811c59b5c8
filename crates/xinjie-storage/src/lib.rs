//! Xinjie Storage crate - the response table behind one gateway trait.
//!
//! Provides an embedded SQLite backend and a pooled PostgreSQL backend
//! that share the same logical queries, plus the schema migrations that
//! run once when a store is opened.

pub mod db;
pub mod migrations;
pub mod postgres;
pub mod queries;
pub mod sqlite;
pub mod store;

pub use db::Database;
pub use postgres::PostgresStore;
pub use queries::Dialect;
pub use sqlite::SqliteStore;
pub use store::{open_store, ResponseStore};
