// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nexus - an authenticated LLM gateway.
//!
//! This is the binary entry point for the gateway and its admin commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Nexus - PII-redacting, content-screening, token-metering LLM gateway.
#[derive(Parser, Debug)]
#[command(name = "nexus", version, about, long_about = None)]
struct Cli {
    /// Extra config file layered over the standard search paths.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway HTTP server.
    Serve,
    /// Manage gateway users and their API keys.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    /// Create a user and print its API key once.
    Create {
        /// Display name for the user.
        name: String,
    },
    /// List users (keys are never shown).
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Delete a user, revoking its key.
    Revoke {
        /// The user's ID.
        user_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and print the effective values, secrets masked.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match nexus_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            nexus_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Users { action }) => match action {
            UsersAction::Create { name } => users::run_create(&config, &name).await,
            UsersAction::List { json } => users::run_list(&config, json).await,
            UsersAction::Revoke { user_id } => users::run_revoke(&config, &user_id).await,
        },
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => serve::run_config_check(&config),
        None => {
            println!("nexus: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_users_create_with_global_config() {
        let cli = Cli::try_parse_from(["nexus", "users", "create", "alice", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Some(Commands::Users {
                action: UsersAction::Create { name },
            }) => assert_eq!(name, "alice"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_config_check() {
        let cli = Cli::try_parse_from(["nexus", "config", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Check
            })
        ));
    }
}
