// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store, mining, and interchange subcommands.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use linq_config::LinqConfig;
use linq_core::{EventId, LinqError, ReplyProvider, StoreKind};
use linq_memory::{interchange, reminder, render, Miner, RuleSet};
use linq_storage::Storage;
use tracing::{info, warn};

use crate::shutdown;

pub(crate) async fn open_storage(config: &LinqConfig) -> Result<Storage, LinqError> {
    Storage::open(&config.storage).await
}

/// Closes `storage` whatever `result` is, so a failed command still
/// checkpoints the WAL. The command's own error wins over a close error.
pub(crate) async fn finish<T>(storage: Storage, result: Result<T, LinqError>) -> Result<T, LinqError> {
    let closed = storage.close().await;
    match result {
        Ok(value) => closed.map(|()| value),
        Err(e) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "failed to close storage after error");
            }
            Err(e)
        }
    }
}

pub async fn record(config: &LinqConfig, user_input: &str, ai_output: &str) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.memory.append(user_input, ai_output).await;
    let id = finish(storage, result).await?;
    println!("recorded turn {id}");
    Ok(())
}

pub async fn mine(config: &LinqConfig, json: bool) -> Result<(), LinqError> {
    let rules = RuleSet::load_or_init(Path::new(&config.rules.path))?;
    let storage = open_storage(config).await?;
    let miner = Miner::new(storage.memory.clone(), storage.preferences.clone());

    let cancel = shutdown::install_signal_handler();
    let result = miner.run(&rules, &cancel).await;
    cancel.cancel();
    let report = finish(storage, result).await?;

    if json {
        let value = serde_json::json!({
            "new_facts": report.new_facts,
            "turns_scanned": report.turns_scanned,
            "matched_turns": report.matched_turns,
            "cancelled": report.cancelled,
            "summary": report.summary,
        });
        println!("{}", to_pretty(&value)?);
    } else {
        let (count, summary) = report.as_tuple();
        println!("{summary} ({count} new, {} turns scanned)", report.turns_scanned);
        if report.cancelled {
            println!("pass interrupted; facts found so far were kept");
        }
    }
    Ok(())
}

pub async fn prefs(config: &LinqConfig, json: bool) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.preferences.all_facts().await;
    let facts = finish(storage, result).await?;
    if json {
        println!("{}", to_pretty(&facts)?);
    } else {
        println!("{}", render(&facts).trim_end());
    }
    Ok(())
}

pub async fn history(config: &LinqConfig, limit: usize) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.memory.recent_turns(limit).await;
    let turns = finish(storage, result).await?;
    if turns.is_empty() {
        println!("no conversation recorded yet");
    }
    for turn in turns {
        println!("[{}] {}", turn.id, turn.created_at);
        println!("  用户: {}", turn.user_input);
        println!("  AI: {}", turn.ai_output);
    }
    Ok(())
}

pub async fn schedule_add(config: &LinqConfig, time: &str, name: &str) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.schedules.add(time, name).await;
    let id = finish(storage, result).await?;
    println!("added event {id}");
    Ok(())
}

pub async fn schedule_list(config: &LinqConfig) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.schedules.list().await;
    let events = finish(storage, result).await?;
    if events.is_empty() {
        println!("no scheduled events");
    }
    for event in events {
        println!("{:>4}  {}  {}", event.id, event.event_time, event.event_name);
    }
    Ok(())
}

pub async fn schedule_delete(config: &LinqConfig, id: EventId) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = storage.schedules.delete(id).await;
    let removed = finish(storage, result).await?;
    println!(
        "deleted event {}: {} {}",
        removed.id, removed.event_time, removed.event_name
    );
    Ok(())
}

/// The CLI has no model attached, so every reminder takes the canned path.
struct NoModel;

#[async_trait]
impl ReplyProvider for NoModel {
    fn name(&self) -> &str {
        "none"
    }

    async fn reply(&self, _prompt: &str) -> Result<String, LinqError> {
        Err(LinqError::Provider {
            message: "no reply provider attached to the CLI".to_string(),
            source: None,
        })
    }
}

pub async fn remind(config: &LinqConfig) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let timeout = Duration::from_secs(config.chat.reply_timeout_secs);
    let result = reminder::remind(
        &storage.schedules,
        &storage.preferences,
        &storage.memory,
        &NoModel,
        timeout,
    )
    .await;
    match finish(storage, result).await? {
        Some(r) => {
            println!("{}", r.text);
            println!();
            println!("今日安排:");
            println!("{}", r.schedule_text);
        }
        None => println!("今天没有即将到来的行程"),
    }
    Ok(())
}

pub async fn import(config: &LinqConfig, kind: StoreKind, file: &Path) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    let result = interchange::import_file(&storage, kind, file).await;
    let report = finish(storage, result).await?;
    println!(
        "imported {} {kind} records ({} duplicates, {} rejected)",
        report.imported,
        report.duplicates,
        report.rejected.len()
    );
    for (index, reason) in &report.rejected {
        println!("  record {index}: {reason}");
    }
    Ok(())
}

pub async fn export(config: &LinqConfig, kind: StoreKind, output: Option<&Path>) -> Result<(), LinqError> {
    let storage = open_storage(config).await?;
    match output {
        Some(path) => {
            let result = interchange::export_file(&storage, kind, path).await;
            let count = finish(storage, result).await?;
            info!(records = count, "export complete");
            eprintln!("wrote {count} {kind} records to {}", path.display());
        }
        None => {
            let result = interchange::export_json(&storage, kind).await;
            println!("{}", finish(storage, result).await?);
        }
    }
    Ok(())
}

pub fn rules(config: &LinqConfig, json: bool) -> Result<(), LinqError> {
    let path = Path::new(&config.rules.path);
    let rules = RuleSet::load_or_init(path)?;
    if json {
        println!("{}", rules.to_json_pretty()?);
        return Ok(());
    }
    println!("rules: {}", path.display());
    for (category, keywords) in rules.iter() {
        println!("  {category}: {}", keywords.join(", "));
    }
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, LinqError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LinqError::Internal(format!("cannot encode output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> LinqConfig {
        let mut config = LinqConfig::default();
        config.storage.database_path = dir.join("linq.db").display().to_string();
        config.rules.path = dir.join("rules.json").display().to_string();
        config
    }

    #[tokio::test]
    async fn failed_command_still_closes_storage() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        let err = schedule_delete(&config, 7).await.unwrap_err();
        assert!(matches!(err, LinqError::NotFound { .. }));
        let err = schedule_add(&config, "25:00", "夜宵").await.unwrap_err();
        assert!(matches!(err, LinqError::Validation(_)));

        // A clean close checkpoints and removes the WAL file.
        let wal = dir.path().join("linq.db-wal");
        assert!(!wal.exists());

        let storage = open_storage(&config).await.unwrap();
        assert!(storage.schedules.list().await.unwrap().is_empty());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn finish_prefers_command_error() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&config_in(dir.path())).await.unwrap();
        let result: Result<(), LinqError> = Err(LinqError::Validation("bad".to_string()));
        let err = finish(storage, result).await.unwrap_err();
        assert!(matches!(err, LinqError::Validation(_)));
    }

    #[tokio::test]
    async fn finish_passes_value_through() {
        let dir = tempdir().unwrap();
        let storage = open_storage(&config_in(dir.path())).await.unwrap();
        let id = storage.memory.append("你好", "").await;
        assert_eq!(finish(storage, id).await.unwrap(), 1);
    }
}
