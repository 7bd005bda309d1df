// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. `Database` is that single writer: clones share the same thread,
//! and query modules go through `database.connection().call()`.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use linq_core::LinqError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the Linq SQLite database.
///
/// Cheap to clone; every clone talks to the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, LinqError> {
        Self::open_with(path, true).await
    }

    /// Open with an explicit journal mode choice.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, LinqError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LinqError::storage(
                    format!("cannot create database directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| LinqError::storage(format!("cannot open database {path}"), e))?;
        let db = Self {
            conn,
            path: path.to_string(),
        };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, LinqError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| LinqError::storage("cannot open in-memory database", e))?;
        let db = Self {
            conn,
            path: ":memory:".to_string(),
        };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), LinqError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(mode = %mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| Ok::<_, rusqlite::Error>(migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?
    }

    /// The shared connection for query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Filesystem path this database was opened from (`:memory:` for in-memory).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run a trivial query to prove the connection is alive.
    pub async fn ping(&self) -> Result<(), LinqError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and close the background connection.
    ///
    /// Other clones of this handle fail with `StorageUnavailable` afterwards.
    pub async fn close(self) -> Result<(), LinqError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| LinqError::storage("failed to close database", e))?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into [`LinqError::StorageUnavailable`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> LinqError {
    let message = match &e {
        tokio_rusqlite::Error::ConnectionClosed => "database connection is closed".to_string(),
        other => format!("database operation failed: {other}"),
    };
    LinqError::storage(message, e)
}
