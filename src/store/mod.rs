//! 持久化实现
//!
//! `Store`/`StoreTx` 边界的 SQLite 实现。

pub mod sqlite;

pub use self::sqlite::SqliteStore;
