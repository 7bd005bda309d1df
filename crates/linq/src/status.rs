// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linq status` command implementation.
//!
//! Shows how much each store holds and where the database and rule file
//! live. Does not create the database if it is missing.

use std::io::IsTerminal;
use std::path::Path;

use linq_config::LinqConfig;
use linq_core::LinqError;
use serde::Serialize;

use crate::commands::{finish, open_storage};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub database_exists: bool,
    pub rules_path: String,
    pub rules_exist: bool,
    pub turns: Option<u64>,
    pub preferences: Option<u64>,
    pub scheduled_events: Option<usize>,
}

/// Human-readable byte count.
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.1} MB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

async fn collect(config: &LinqConfig) -> Result<StatusResponse, LinqError> {
    let database_exists = Path::new(&config.storage.database_path).exists();
    let mut status = StatusResponse {
        database_path: config.storage.database_path.clone(),
        database_exists,
        rules_path: config.rules.path.clone(),
        rules_exist: Path::new(&config.rules.path).exists(),
        turns: None,
        preferences: None,
        scheduled_events: None,
    };
    if database_exists {
        let storage = open_storage(config).await?;
        let counts = async {
            Ok::<_, LinqError>((
                storage.memory.count().await?,
                storage.preferences.count().await?,
                storage.schedules.list().await?.len(),
            ))
        }
        .await;
        let (turns, preferences, events) = finish(storage, counts).await?;
        status.turns = Some(turns);
        status.preferences = Some(preferences);
        status.scheduled_events = Some(events);
    }
    Ok(status)
}

/// Run the `linq status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(config: &LinqConfig, json: bool, plain: bool) -> Result<(), LinqError> {
    let status = collect(config).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!();
    println!("  linq status");
    println!("  {}", "-".repeat(35));

    if status.database_exists {
        let size = std::fs::metadata(&status.database_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        print_line("Database", &format!("{} ({size})", status.database_path), true, use_color);
        println!("    Turns:        {}", status.turns.unwrap_or(0));
        println!("    Preferences:  {}", status.preferences.unwrap_or(0));
        println!("    Events:       {}", status.scheduled_events.unwrap_or(0));
    } else {
        print_line(
            "Database",
            &format!("{} (not created yet)", status.database_path),
            false,
            use_color,
        );
    }
    let rules_note = if status.rules_exist { "" } else { " (defaults written on first use)" };
    print_line(
        "Rules",
        &format!("{}{rules_note}", status.rules_path),
        status.rules_exist,
        use_color,
    );
    println!();
    Ok(())
}

fn print_line(label: &str, value: &str, ok: bool, use_color: bool) {
    if use_color {
        use colored::Colorize;
        let mark = if ok { "✓".green() } else { "-".yellow() };
        println!("    {mark} {label:<10} {value}");
    } else {
        let mark = if ok { "[OK]" } else { "[--]" };
        println!("    {mark} {label:<10} {value}");
    }
}
