// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection lifecycle.
//!
//! [`Database`] wraps a single `tokio-rusqlite` connection whose background
//! thread serializes every statement (see [`crate::writer`]). Opening the
//! database applies pragmas and runs embedded migrations; closing it
//! checkpoints the WAL so no `-wal` file outlives a clean shutdown.

use basera_core::BaseraError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Handle to the SQLite database.
///
/// Cloning is cheap: every clone shares the same background connection
/// thread, so all writes remain serialized through one writer.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply pragmas,
    /// and run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BaseraError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let migrated = conn
            .call(|conn| -> Result<Result<(), BaseraError>, rusqlite::Error> {
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migrated?;

        debug!(path, wal_mode, "database open");
        Ok(Self { conn })
    }

    /// The underlying async connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and shut down the connection thread.
    pub async fn close(self) -> Result<(), BaseraError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        self.conn.close().await.map_err(map_tr_err)?;
        Ok(())
    }
}

/// Map a `tokio-rusqlite` transport or statement error into the shared
/// error type.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> BaseraError {
    BaseraError::Storage {
        source: Box::new(err),
    }
}
