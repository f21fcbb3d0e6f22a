// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use nexus_core::NexusError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;
     PRAGMA foreign_keys = ON;";

/// Handle to the user database. Cheap to share by reference; every query
/// module takes `&Database`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file, applies PRAGMAs and
    /// runs pending migrations.
    pub async fn open(path: &str) -> Result<Self, NexusError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| NexusError::Storage {
                source: Box::new(e),
            })?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        let db = Self { conn };
        db.prepare().await?;
        debug!(path, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database, for tests and throwaway runs.
    pub async fn open_in_memory() -> Result<Self, NexusError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        let db = Self { conn };
        db.prepare().await?;
        Ok(db)
    }

    async fn prepare(&self) -> Result<(), NexusError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(PRAGMAS)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .call(|conn| run_migrations(conn))
            .await
            .map_err(|e| NexusError::Storage {
                source: e.to_string().into(),
            })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), NexusError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite error into [`NexusError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> NexusError {
    NexusError::Storage {
        source: e.to_string().into(),
    }
}
