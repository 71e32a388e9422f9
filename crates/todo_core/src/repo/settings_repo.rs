//! Key/value settings persistence.
//!
//! # Responsibility
//! - Store user preferences as string values keyed by stable names.
//!
//! # Invariants
//! - Keys are unique; `set` overwrites the previous value.
//! - Typed interpretation lives in [`crate::service::settings_service`].

use super::{ensure_table_ready, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for preference storage.
pub trait SettingsRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes one key. Missing keys are not an error.
    fn remove(&self, key: &str) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
#[derive(Clone, Copy)]
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "settings", &["key", "value", "updated_at"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1;", [key])?;
        Ok(())
    }
}
