use super::schema::CACHE_VERSIONED_SCHEMAS;
use super::CacheStore;
use crate::sqlite_persistence::read_schema_version;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteCacheStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCacheStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open cache database")?;
        let latest = CACHE_VERSIONED_SCHEMAS
            .last()
            .context("No cache schema declared")?;

        if is_new_db {
            info!("Creating new cache database at {:?}", path);
            latest.create(&conn)?;
        } else {
            let db_version = read_schema_version(&conn)?;
            let schema = CACHE_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown cache database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Cache database schema validation failed for version {}",
                    db_version
                )
            })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Cache database lock poisoned"))?;
        f(&conn)
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read cache entry {}", key))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 created_at = cast(strftime('%s','now') as int)",
                params![key, value],
            )
            .with_context(|| format!("Failed to write cache entry {}", key))?;
            Ok(())
        })
    }

    fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}
