// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linq watch` command implementation.
//!
//! Keeps the store open and runs a mining pass every interval. When
//! `rules.watch` is set, edits to the rule file are picked up between
//! passes without a restart. Stops on SIGINT/SIGTERM; a pass in progress
//! is cancelled at the next turn boundary and keeps what it already wrote.

use std::sync::Arc;
use std::time::Duration;

use linq_config::LinqConfig;
use linq_core::LinqError;
use linq_memory::{spawn_mining_pass, Miner, RuleBook, RuleWatcher};
use tracing::{error, info, warn};

use crate::commands::open_storage;
use crate::shutdown;

pub async fn run_watch(config: &LinqConfig, interval_secs: u64) -> Result<(), LinqError> {
    if interval_secs == 0 {
        return Err(LinqError::Validation(
            "--interval-secs must be at least 1".to_string(),
        ));
    }

    let book = Arc::new(RuleBook::load(&config.rules.path)?);
    // Watching stops when this is dropped.
    let _watcher = if config.rules.watch {
        match RuleWatcher::spawn(Arc::clone(&book)) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "rule hot reload disabled");
                None
            }
        }
    } else {
        None
    };

    let storage = open_storage(config).await?;
    let miner = Miner::new(storage.memory.clone(), storage.preferences.clone());
    let cancel = shutdown::install_signal_handler();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    info!(interval_secs, rules = %book.path().display(), "linq watch started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let handle = spawn_mining_pass(miner.clone(), &book, cancel.child_token());
        match handle.await {
            Ok(Ok(report)) if report.new_facts > 0 => {
                println!("{}", report.summary);
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!(error = %e, "mining pass failed"),
            Err(e) => error!(error = %e, "mining task panicked"),
        }
    }

    storage.close().await?;
    info!("linq watch stopped");
    Ok(())
}
