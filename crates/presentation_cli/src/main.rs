//! tidelog CLI
//!
//! Migrates, synchronizes and watches a user's calendar store.

#![allow(clippy::print_stdout)]

mod notifier;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use domain::UserId;
use infrastructure::{AppConfig, init_logging};

use crate::session::RemoteSource;

/// tidelog CLI
#[derive(Parser)]
#[command(name = "tidelog")]
#[command(author, version, about = "Per-user calendar migration, sync and reminders", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config", env = "TIDELOG_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the global event store into a user's store, at most once
    Migrate {
        /// User whose store receives the events
        user: String,
    },

    /// Run one sync pass and print the resulting status
    Sync {
        user: String,

        /// Sync against a tidelog server instead of the local data directory
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Migrate (a failure is logged, not fatal), then keep the cache in sync
    /// and fire reminders until Ctrl+C
    Run {
        user: String,

        /// Sync against a tidelog server instead of the local data directory
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Schedule a reminder and wait for it
    ///
    /// Example: tidelog remind "Dentist" 2025-03-04T14:00 --offset 15
    Remind {
        title: String,

        /// Start time: RFC 3339, local date-time, or a bare date (midnight local time)
        start: String,

        /// Minutes before the start to remind (default: 30)
        #[arg(short, long)]
        offset: Option<String>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn parse_user(raw: &str) -> anyhow::Result<UserId> {
    UserId::parse(raw).with_context(|| format!("invalid user id '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.logging.filter = filter.to_string();
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Migrate { user } => {
            let user_id = parse_user(&user)?;
            let report = session::migrate(&config, &user_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        },

        Commands::Sync { user, server } => {
            let user_id = parse_user(&user)?;
            let (outcome, status) =
                session::sync_once(&config, &user_id, &RemoteSource::from_flag(server)).await?;
            println!("{outcome:?}: {status}");
        },

        Commands::Run { user, server } => {
            let user_id = parse_user(&user)?;
            session::run(&config, &user_id, &RemoteSource::from_flag(server)).await?;
        },

        Commands::Remind {
            title,
            start,
            offset,
        } => {
            session::remind(&config, &title, &start, offset.as_deref()).await?;
            println!("Done at {}", Utc::now().format("%H:%M:%S"));
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn remind_help_describes_date_only_start() {
        let mut cmd = Cli::command();
        let help = cmd
            .find_subcommand_mut("remind")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("bare date (midnight local time)"));
        assert!(!help.contains("all-day"));
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter_from_verbosity(0), None);
        assert_eq!(log_filter_from_verbosity(2), Some("debug"));
        assert_eq!(log_filter_from_verbosity(9), Some("trace"));
    }
}
