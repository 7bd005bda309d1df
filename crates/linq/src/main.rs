// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linq - conversational memory and preference mining.
//!
//! This is the binary entry point: an administrative CLI that drives the
//! memory store, the preference miner, and the schedule.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod backup;
mod commands;
mod doctor;
mod shutdown;
mod status;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linq_core::{EventId, StoreKind};

/// Linq - conversational memory and preference mining.
#[derive(Parser, Debug)]
#[command(name = "linq", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Append one conversation turn to the memory store.
    Record {
        user_input: String,
        ai_output: String,
    },
    /// Run a preference mining pass over every stored turn.
    Mine {
        #[arg(long)]
        json: bool,
    },
    /// Print the memory digest rendered from stored preferences.
    Prefs {
        /// List raw facts as JSON instead of the digest.
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent conversation turns.
    History {
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },
    /// Manage scheduled events.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Generate a reminder for today's schedule and record it.
    Remind,
    /// Import records from a JSON file.
    Import {
        /// conversation (memory), preference, or schedule.
        kind: StoreKind,
        file: PathBuf,
    },
    /// Export a store as JSON.
    Export {
        kind: StoreKind,
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the active mining rules.
    Rules {
        #[arg(long)]
        json: bool,
    },
    /// Mine periodically, reloading rules on change, until interrupted.
    Watch {
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Show store sizes and file locations.
    Status {
        #[arg(long)]
        json: bool,
        #[arg(long)]
        plain: bool,
    },
    /// Run diagnostic checks.
    Doctor {
        #[arg(long)]
        deep: bool,
        #[arg(long)]
        plain: bool,
    },
    /// Copy the database to a file.
    Backup { path: PathBuf },
    /// Replace the database with a backup copy.
    Restore { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ScheduleAction {
    /// Add an event at HH:MM.
    Add { time: String, name: String },
    /// List events in time order.
    List,
    /// Delete an event by id.
    Delete { id: EventId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => linq_config::load_and_validate_path(path),
        None => linq_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            linq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command {
        Some(Commands::Record {
            user_input,
            ai_output,
        }) => commands::record(&config, &user_input, &ai_output).await,
        Some(Commands::Mine { json }) => commands::mine(&config, json).await,
        Some(Commands::Prefs { json }) => commands::prefs(&config, json).await,
        Some(Commands::History { limit }) => commands::history(&config, limit).await,
        Some(Commands::Schedule { action }) => match action {
            ScheduleAction::Add { time, name } => {
                commands::schedule_add(&config, &time, &name).await
            }
            ScheduleAction::List => commands::schedule_list(&config).await,
            ScheduleAction::Delete { id } => commands::schedule_delete(&config, id).await,
        },
        Some(Commands::Remind) => commands::remind(&config).await,
        Some(Commands::Import { kind, file }) => commands::import(&config, kind, &file).await,
        Some(Commands::Export { kind, output }) => {
            commands::export(&config, kind, output.as_deref()).await
        }
        Some(Commands::Rules { json }) => commands::rules(&config, json),
        Some(Commands::Watch { interval_secs }) => watch::run_watch(&config, interval_secs).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Doctor { deep, plain }) => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Some(Commands::Backup { path }) => {
            backup::run_backup(&config.storage.database_path, &path)
        }
        Some(Commands::Restore { path }) => {
            backup::run_restore(&config.storage.database_path, &path)
        }
        None => {
            println!("linq: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linq={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn store_kind_arguments_accept_aliases() {
        let cli = Cli::try_parse_from(["linq", "export", "memory"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Export {
                kind: StoreKind::Conversation,
                output: None
            })
        ));
        assert!(Cli::try_parse_from(["linq", "export", "calendar"]).is_err());
    }

    #[test]
    fn schedule_delete_parses_id() {
        let cli = Cli::try_parse_from(["linq", "schedule", "delete", "7"]).unwrap();
        match cli.command {
            Some(Commands::Schedule {
                action: ScheduleAction::Delete { id },
            }) => assert_eq!(id, 7),
            other => panic!("unexpected parse: {other:?}"),
        }
    }
}
