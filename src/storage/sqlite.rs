//! SQLite measure store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;

use super::{InsertOutcome, MeasureStore};
use crate::error::{AppError, Result};
use crate::models::Measure;

/// Measure store backed by a single SQLite file.
///
/// The `url` column carries a UNIQUE constraint; that constraint, not the
/// read-side `exists` check, is what enforces at-most-one row per URL
/// under concurrent inserts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file and schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS measures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(AppError::store)
    }
}

#[async_trait]
impl MeasureStore for SqliteStore {
    async fn exists(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM measures WHERE url = ?1)",
            rusqlite::params![url],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    async fn insert_if_absent(&self, measure: &Measure) -> Result<InsertOutcome> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO measures (url, title, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![measure.url, measure.title, Utc::now().to_rfc3339()],
        )?;
        Ok(if changed == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        })
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM measures", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
