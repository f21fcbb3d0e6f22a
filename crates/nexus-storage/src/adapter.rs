// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the UserStore trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use nexus_config::model::StorageConfig;
use nexus_core::types::{NewUser, User};
use nexus_core::{AdapterType, HealthStatus, NexusError, PluginAdapter, UserStore};

use crate::database::Database;
use crate::keys::{generate_api_key, hash_api_key, key_prefix};
use crate::queries;

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 128;

/// SQLite-backed user store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`SqliteUserStore::initialize`].
pub struct SqliteUserStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteUserStore {
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already open database.
    pub fn with_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    pub async fn initialize(&self) -> Result<(), NexusError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| NexusError::Storage {
            source: "user store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite user store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, NexusError> {
        self.db.get().ok_or_else(|| NexusError::Storage {
            source: "user store not initialized -- call initialize() first".into(),
        })
    }
}

fn validate_name(name: &str) -> Result<&str, NexusError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NexusError::Validation("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NexusError::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[async_trait]
impl PluginAdapter for SqliteUserStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::UserStore
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NexusError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn lookup(&self, api_key: &str) -> Result<Option<User>, NexusError> {
        queries::users::find_by_key_hash(self.db()?, &hash_api_key(api_key)).await
    }

    async fn create(&self, name: &str) -> Result<NewUser, NexusError> {
        let name = validate_name(name)?;
        let api_key = generate_api_key();
        let user = User {
            user_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            key_prefix: key_prefix(&api_key),
            created_at: Utc::now(),
        };
        queries::users::insert_user(self.db()?, &user, &hash_api_key(&api_key)).await?;
        info!(user_id = %user.user_id, key_prefix = %user.key_prefix, "user created");
        Ok(NewUser { user, api_key })
    }

    async fn list(&self) -> Result<Vec<User>, NexusError> {
        queries::users::list_users(self.db()?).await
    }

    async fn delete(&self, user_id: &str) -> Result<bool, NexusError> {
        let deleted = queries::users::delete_user(self.db()?, user_id).await?;
        if deleted {
            info!(user_id, "user deleted");
        }
        Ok(deleted)
    }
}
