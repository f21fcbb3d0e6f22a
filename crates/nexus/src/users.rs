// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nexus users` command implementations.
//!
//! These talk to the SQLite user store directly, so the first API key can be
//! minted before the gateway has ever been started.

use nexus_config::model::NexusConfig;
use nexus_core::types::User;
use nexus_core::{NexusError, UserStore};
use nexus_storage::SqliteUserStore;

async fn open_store(config: &NexusConfig) -> Result<SqliteUserStore, NexusError> {
    let store = SqliteUserStore::new(config.storage.clone());
    store.initialize().await?;
    Ok(store)
}

/// Runs `nexus users create <name>`.
pub async fn run_create(config: &NexusConfig, name: &str) -> Result<(), NexusError> {
    let store = open_store(config).await?;
    let created = store.create(name).await?;
    println!("user_id:    {}", created.user.user_id);
    println!("name:       {}", created.user.name);
    println!("api_key:    {}", created.api_key);
    eprintln!("Store this key now. It cannot be shown again.");
    Ok(())
}

/// Runs `nexus users list`.
pub async fn run_list(config: &NexusConfig, json: bool) -> Result<(), NexusError> {
    let store = open_store(config).await?;
    let users = store.list().await?;
    if json {
        let rendered = serde_json::to_string_pretty(&users)
            .map_err(|e| NexusError::Internal(format!("failed to render users: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", format_table(&users));
    }
    Ok(())
}

/// Runs `nexus users revoke <id>`.
pub async fn run_revoke(config: &NexusConfig, user_id: &str) -> Result<(), NexusError> {
    let store = open_store(config).await?;
    if store.delete(user_id).await? {
        println!("revoked {user_id}");
        Ok(())
    } else {
        Err(NexusError::NotFound(format!("user {user_id}")))
    }
}

fn format_table(users: &[User]) -> String {
    if users.is_empty() {
        return "no users\n".to_string();
    }
    let id_width = users
        .iter()
        .map(|u| u.user_id.len())
        .max()
        .unwrap_or(0)
        .max("USER ID".len());
    let name_width = users
        .iter()
        .map(|u| u.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{:<id_width$}  {:<name_width$}  {:<10}  CREATED\n",
        "USER ID", "NAME", "KEY"
    );
    for user in users {
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {:<10}  {}\n",
            user.user_id,
            user.name,
            format!("{}…", user.key_prefix),
            user.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}
