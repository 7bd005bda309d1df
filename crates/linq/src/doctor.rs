// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linq doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration, the database, and the
//! rule file.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use linq_config::LinqConfig;
use linq_core::LinqError;
use linq_memory::RuleSet;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `linq doctor` command.
///
/// With `--deep`, also runs `PRAGMA integrity_check`.
pub async fn run_doctor(
    config: &LinqConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), LinqError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![
        check_config(config_path),
        check_database(&config.storage.database_path).await,
        check_rules(&config.rules.path),
    ];
    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
    }

    println!();
    println!("  linq doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<16} {} ({ms}ms)", result.name, result.message)
    }
}

/// Check configuration loads without errors.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(p) => linq_config::load_and_validate_path(p),
        None => linq_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the database file exists and answers a query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first use)"),
            start,
        );
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<i64, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    conn.query_row(
                        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('turns', 'preferences', 'schedules')",
                        [],
                        |row| row.get(0),
                    )
                })
                .await;
            match result {
                Ok(3) => CheckResult::new("Database", CheckStatus::Pass, "connected", start),
                Ok(n) => CheckResult::new(
                    "Database",
                    CheckStatus::Warn,
                    format!("{n} of 3 tables present (migrations run on next open)"),
                    start,
                ),
                Err(e) => CheckResult::new(
                    "Database",
                    CheckStatus::Fail,
                    format!("query failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ),
    }
}

/// Check the rule file parses. A missing file is fine: defaults get written.
fn check_rules(rules_path: &str) -> CheckResult {
    let start = Instant::now();
    let text = match std::fs::read_to_string(rules_path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CheckResult::new(
                "Rules",
                CheckStatus::Warn,
                format!("not found: {rules_path} (defaults will be written)"),
                start,
            );
        }
        Err(e) => {
            return CheckResult::new("Rules", CheckStatus::Fail, format!("unreadable: {e}"), start);
        }
    };
    match RuleSet::from_json(&text) {
        Ok(rules) if rules.is_empty() => CheckResult::new(
            "Rules",
            CheckStatus::Warn,
            "no keywords defined; mining will find nothing",
            start,
        ),
        Ok(rules) => CheckResult::new(
            "Rules",
            CheckStatus::Pass,
            format!(
                "{} categories, {} keywords",
                rules.category_count(),
                rules.keyword_count()
            ),
            start,
        ),
        Err(e) => CheckResult::new("Rules", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<Vec<String>, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows = stmt
                        .query_map([], |row| row.get(0))?
                        .collect::<Result<Vec<String>, _>>()?;
                    Ok(rows)
                })
                .await;
            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
                    CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
                }
                Ok(rows) => CheckResult::new(
                    "DB integrity",
                    CheckStatus::Fail,
                    format!("{} issue(s) found", rows.len()),
                    start,
                ),
                Err(e) => CheckResult::new(
                    "DB integrity",
                    CheckStatus::Fail,
                    format!("check failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ),
    }
}
