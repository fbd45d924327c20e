//! SQLite-backed implementation of the storage ports.

use std::{path::Path, sync::Mutex};

use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    domain::ChatId,
    errors::Error,
    ports::{CounterEntry, CounterStore, Subscriber, SubscriberStore},
    Result,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stats (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS subscribers (
    chat_id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

// Sorts after the legacy `datetime('now')` format for equal seconds.
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

struct Inner {
    conn: Connection,
    last_created_at: Option<NaiveDateTime>,
}

/// A single SQLite connection guarded by a mutex.
///
/// Every operation is one short statement, so callers hold the lock only for
/// the duration of that statement.
pub struct SqliteStore {
    inner: Mutex<Inner>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        // WAL is not available for in-memory databases, so only file stores set it.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                last_created_at: None,
            }),
        })
    }

    fn with_inner<T>(&self, op: impl FnOnce(&mut Inner) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::External("sqlite store mutex poisoned".to_string()))?;
        op(&mut guard)
    }
}

impl Inner {
    /// Strictly increasing creation timestamp, so insertion order survives
    /// several subscriptions within the same clock tick.
    fn next_created_at(&mut self) -> String {
        let mut now = Utc::now().naive_utc();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now.format(CREATED_AT_FORMAT).to_string()
    }
}

impl CounterStore for SqliteStore {
    fn increment(&self, label: &str) -> Result<u64> {
        self.with_inner(|inner| {
            let value: i64 = inner.conn.query_row(
                "INSERT INTO stats (key, value) VALUES (?1, 1)
                 ON CONFLICT(key) DO UPDATE SET value = value + 1
                 RETURNING value",
                params![label],
                |row| row.get(0),
            )?;
            Ok(value.max(0) as u64)
        })
    }

    fn counters(&self) -> Result<Vec<CounterEntry>> {
        self.with_inner(|inner| {
            let mut stmt = inner
                .conn
                .prepare("SELECT key, value FROM stats ORDER BY value DESC, key ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(CounterEntry {
                    label: row.get(0)?,
                    count: row.get::<_, i64>(1)?.max(0) as u64,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

impl SubscriberStore for SqliteStore {
    fn insert_subscriber(&self, chat_id: ChatId) -> Result<bool> {
        self.with_inner(|inner| {
            let exists = inner
                .conn
                .query_row(
                    "SELECT 1 FROM subscribers WHERE chat_id = ?1",
                    params![chat_id.0],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if exists {
                return Ok(false);
            }

            let created_at = inner.next_created_at();
            let changed = inner.conn.execute(
                "INSERT OR IGNORE INTO subscribers (chat_id, created_at) VALUES (?1, ?2)",
                params![chat_id.0, created_at],
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_subscriber(&self, chat_id: ChatId) -> Result<bool> {
        self.with_inner(|inner| {
            let changed = inner
                .conn
                .execute("DELETE FROM subscribers WHERE chat_id = ?1", params![chat_id.0])?;
            Ok(changed > 0)
        })
    }

    fn subscriber_count(&self) -> Result<u64> {
        self.with_inner(|inner| {
            let count: i64 =
                inner
                    .conn
                    .query_row("SELECT COUNT(*) FROM subscribers", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
    }

    fn subscribers(&self) -> Result<Vec<Subscriber>> {
        self.with_inner(|inner| {
            let mut stmt = inner
                .conn
                .prepare("SELECT chat_id, created_at FROM subscribers ORDER BY created_at ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(Subscriber {
                    chat_id: ChatId(row.get(0)?),
                    created_at: row.get(1)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}
