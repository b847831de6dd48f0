use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{CollegeRecord, Preferences, WatchlistEntry};

pub const COLLEGES_KEY: &str = "colleges";
pub const WATCHLIST_KEY: &str = "watchlist";
pub const PREFERENCES_KEY: &str = "preferences";
pub const LAST_SYNC_KEY: &str = "lastSync";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("bad JSON under key {key:?}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of [`Store::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Inserted,
    Replaced,
}

/// Durable key-value store holding whole JSON collections.
///
/// Every mutation is one read-merge-write unit: the in-process mutex
/// serializes callers sharing a `Store`, and `BEGIN IMMEDIATE` takes the
/// SQLite write lock up front so other connections to the same file wait
/// instead of interleaving their read with ours.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_conn(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        init_schema(&conn)?;
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Seed each missing key: empty collections, default preferences and the
    /// sync stamp. Keys already present are left alone. Returns true when
    /// anything was seeded.
    pub fn init_defaults(&self) -> Result<bool> {
        self.transact(|conn| {
            let mut seeded = Vec::new();
            if !has_key(conn, COLLEGES_KEY)? {
                save(conn, COLLEGES_KEY, &Vec::<CollegeRecord>::new())?;
                seeded.push(COLLEGES_KEY);
            }
            if !has_key(conn, WATCHLIST_KEY)? {
                save(conn, WATCHLIST_KEY, &Vec::<WatchlistEntry>::new())?;
                seeded.push(WATCHLIST_KEY);
            }
            if !has_key(conn, PREFERENCES_KEY)? {
                save(conn, PREFERENCES_KEY, &Preferences::default())?;
                seeded.push(PREFERENCES_KEY);
            }
            if !has_key(conn, LAST_SYNC_KEY)? {
                save(conn, LAST_SYNC_KEY, &Utc::now().timestamp_millis())?;
                seeded.push(LAST_SYNC_KEY);
            }
            if !seeded.is_empty() {
                info!(?seeded, "Initialized college store defaults");
            }
            Ok(!seeded.is_empty())
        })
    }

    /// Replace the record with the same name, or append it.
    pub fn reconcile(&self, record: CollegeRecord) -> Result<Reconciled> {
        let name = record.name.clone();
        let outcome = self.transact(|conn| {
            let mut colleges: Vec<CollegeRecord> = load(conn, COLLEGES_KEY)?;
            let outcome = merge_record(&mut colleges, record);
            save(conn, COLLEGES_KEY, &colleges)?;
            Ok(outcome)
        })?;
        info!(?outcome, "College data saved: {}", name);
        Ok(outcome)
    }

    /// Append `entry` unless its URL is already watched. Returns whether it
    /// was inserted.
    pub fn reconcile_watchlist(&self, entry: WatchlistEntry) -> Result<bool> {
        let url = entry.url.clone();
        let inserted = self.transact(|conn| {
            let mut watchlist: Vec<WatchlistEntry> = load(conn, WATCHLIST_KEY)?;
            if !merge_watch(&mut watchlist, entry) {
                return Ok(false);
            }
            save(conn, WATCHLIST_KEY, &watchlist)?;
            Ok(true)
        })?;
        debug!(inserted, "Watchlist reconcile for {}", url);
        Ok(inserted)
    }

    pub fn colleges(&self) -> Result<Vec<CollegeRecord>> {
        self.read(|conn| load(conn, COLLEGES_KEY))
    }

    pub fn watchlist(&self) -> Result<Vec<WatchlistEntry>> {
        self.read(|conn| load(conn, WATCHLIST_KEY))
    }

    pub fn find(&self, name: &str) -> Result<Option<CollegeRecord>> {
        Ok(self.colleges()?.into_iter().find(|c| c.name == name))
    }

    pub fn preferences(&self) -> Result<Preferences> {
        self.read(|conn| load(conn, PREFERENCES_KEY))
    }

    /// Milliseconds since the epoch recorded at install, if seeded.
    pub fn last_sync(&self) -> Result<Option<i64>> {
        self.read(|conn| load(conn, LAST_SYNC_KEY))
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    /// Run `f` inside an IMMEDIATE transaction; commit on Ok, roll back on Err.
    fn transact<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

// ── Merge rules ──

/// Exact, case-sensitive name match replaces the whole record.
pub fn merge_record(colleges: &mut Vec<CollegeRecord>, record: CollegeRecord) -> Reconciled {
    match colleges.iter().position(|c| c.name == record.name) {
        Some(i) => {
            colleges[i] = record;
            Reconciled::Replaced
        }
        None => {
            colleges.push(record);
            Reconciled::Inserted
        }
    }
}

/// Exact URL match makes the insert a no-op.
pub fn merge_watch(watchlist: &mut Vec<WatchlistEntry>, entry: WatchlistEntry) -> bool {
    if watchlist.iter().any(|w| w.url == entry.url) {
        return false;
    }
    watchlist.push(entry);
    true
}

// ── Key-value access ──

fn has_key(conn: &Connection, key: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM kv WHERE key = ?1", [key], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Load and decode the value under `key`; a missing key reads as default.
fn load<T: DeserializeOwned + Default>(conn: &Connection, key: &str) -> Result<T> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
        .optional()?;
    match raw {
        Some(s) => serde_json::from_str(&s).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

fn save<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        rusqlite::params![key, json],
    )?;
    Ok(())
}

// ── Tests ──
