// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD operations.

use chrono::{DateTime, Utc};
use nexus_core::NexusError;
use nexus_core::types::User;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(User {
        user_id: row.get(0)?,
        name: row.get(1)?,
        key_prefix: row.get(2)?,
        created_at,
    })
}

/// Insert a user with the digest of their key.
pub async fn insert_user(db: &Database, user: &User, key_hash: &str) -> Result<(), NexusError> {
    let user = user.clone();
    let key_hash = key_hash.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, name, key_hash, key_prefix, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.user_id,
                    user.name,
                    key_hash,
                    user.key_prefix,
                    user.created_at
                        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find the user whose key hashes to `key_hash`.
pub async fn find_by_key_hash(db: &Database, key_hash: &str) -> Result<Option<User>, NexusError> {
    let key_hash = key_hash.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, name, key_prefix, created_at FROM users WHERE key_hash = ?1",
            )?;
            match stmt.query_row(params![key_hash], row_to_user) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All users, newest first.
pub async fn list_users(db: &Database) -> Result<Vec<User>, NexusError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, name, key_prefix, created_at FROM users
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt.query_map([], row_to_user)?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a user. Returns whether a row was removed.
pub async fn delete_user(db: &Database, user_id: &str) -> Result<bool, NexusError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user(id: &str, age_secs: i64) -> User {
        User {
            user_id: id.to_string(),
            name: format!("name-{id}"),
            key_prefix: "nx-abcde".to_string(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_hash() {
        let db = Database::open_in_memory().await.unwrap();
        let u = user("u1", 0);
        insert_user(&db, &u, "hash-1").await.unwrap();

        let found = find_by_key_hash(&db, "hash-1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "u1");
        assert_eq!(found.name, "name-u1");
        assert_eq!(found.created_at.timestamp_micros(), u.created_at.timestamp_micros());
        assert!(find_by_key_hash(&db, "hash-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        insert_user(&db, &user("old", 100), "h1").await.unwrap();
        insert_user(&db, &user("new", 0), "h2").await.unwrap();
        insert_user(&db, &user("mid", 50), "h3").await.unwrap();

        let ids: Vec<String> = list_users(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn duplicate_key_hash_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        insert_user(&db, &user("a", 0), "same").await.unwrap();
        let err = insert_user(&db, &user("b", 0), "same").await.unwrap_err();
        assert!(matches!(err, NexusError::Storage { .. }));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let db = Database::open_in_memory().await.unwrap();
        insert_user(&db, &user("a", 0), "h").await.unwrap();
        assert!(delete_user(&db, "a").await.unwrap());
        assert!(!delete_user(&db, "a").await.unwrap());
        assert!(find_by_key_hash(&db, "h").await.unwrap().is_none());
    }
}
