//! DuckDB-backed document store.
//!
//! Each collection is one table keyed by document id. DuckDB calls are
//! blocking, so every operation runs on tokio's blocking pool behind the
//! shared connection mutex.

use crate::document::CredentialDocument;
use crate::error::{StorageError, StorageResult};
use crate::DocumentStore;
use async_trait::async_trait;
use chrono::Utc;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const MEMORY_LIMIT: &str = "64MB";
const THREADS: u32 = 1;

#[derive(Clone)]
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl DuckDbStore {
    /// Opens (or creates) the database at `path` and the table backing
    /// `collection`. `":memory:"` opens an in-memory database.
    pub fn open(path: &Path, collection: &str) -> StorageResult<Self> {
        if path.to_str() == Some(":memory:") {
            return Self::open_in_memory(collection);
        }
        let conn = open_with_wal_recovery(path)?;
        Self::with_connection(conn, collection)
    }

    pub fn open_in_memory(collection: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> StorageResult<Self> {
        let table = format!("docs_{}", sanitize_for_sql(collection));
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id VARCHAR PRIMARY KEY,
                username VARCHAR NOT NULL,
                password VARCHAR NOT NULL,
                modified_at BIGINT NOT NULL
            );"
        ))?;
        debug!(table = %table, "document table ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table,
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection, &str) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Backend("connection lock poisoned".into()))?;
            f(&conn, &table)
        })
        .await
        .map_err(|e| StorageError::Backend(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl DocumentStore for DuckDbStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        let key = key.to_string();
        self.run(move |conn, table| {
            let mut stmt =
                conn.prepare(&format!("SELECT username, password FROM {table} WHERE id = ?"))?;
            let mut rows = stmt.query_map(params![key], |row| {
                Ok(CredentialDocument {
                    username: row.get(0)?,
                    password: row.get(1)?,
                })
            })?;
            Ok(rows.next().transpose()?)
        })
        .await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        let key = key.to_string();
        let doc = doc.clone();
        self.run(move |conn, table| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {table} (id, username, password, modified_at)
                     VALUES (?, ?, ?, ?)"
                ),
                params![key, doc.username, doc.password, Utc::now().timestamp_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let key = key.to_string();
        self.run(move |conn, table| {
            let affected =
                conn.execute(&format!("DELETE FROM {table} WHERE id = ?"), params![key])?;
            if affected == 0 {
                return Err(StorageError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        self.run(|conn, table| {
            let mut stmt =
                conn.prepare(&format!("SELECT id, username, password FROM {table} ORDER BY id"))?;
            let docs = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        CredentialDocument {
                            username: row.get(1)?,
                            password: row.get(2)?,
                        },
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(docs)
        })
        .await
    }
}

/// Replaces any character that isn't alphanumeric or underscore with '_'.
fn sanitize_for_sql(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Opens a DuckDB file, removing a stale WAL left by an unclean shutdown and
/// retrying once if the first open fails.
fn open_with_wal_recovery(path: &Path) -> StorageResult<Connection> {
    let conn = match Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() && std::fs::remove_file(&wal_path).is_ok() {
                warn!(wal = %wal_path.display(), "DuckDB open failed, removed stale WAL and retrying");
                Connection::open(path)?
            } else {
                return Err(first_err.into());
            }
        }
    };
    // DuckDB defaults to ~80% of RAM and every core per connection.
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{MEMORY_LIMIT}'; PRAGMA threads={THREADS};"
    ))?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_identifier_chars() {
        assert_eq!(sanitize_for_sql("credentials"), "credentials");
        assert_eq!(sanitize_for_sql("my-vault.v2"), "my_vault_v2");
        assert_eq!(sanitize_for_sql("a; DROP TABLE x"), "a__DROP_TABLE_x");
    }
}
