// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens the three stores over a temp SQLite file and wires a
//! miner and a chat recorder to a [`MockReplyProvider`].

use std::sync::Arc;

use linq_config::model::{ChatConfig, StorageConfig};
use linq_core::LinqError;
use linq_memory::{ChatRecorder, Miner, MiningReport, PlainPromptBuilder, RuleBook, RuleSet};
use linq_storage::Storage;
use tokio_util::sync::CancellationToken;

use crate::mock_provider::MockReplyProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    rules: RuleSet,
    chat: ChatConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            rules: RuleSet::default_rules(),
            chat: ChatConfig::default(),
        }
    }

    /// Set mock reply script.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// Mine with `rules` instead of the built-in set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_reply_timeout_secs(mut self, secs: u64) -> Self {
        self.chat.reply_timeout_secs = secs;
        self
    }

    /// Build the harness over a fresh temp database.
    pub async fn build(self) -> Result<TestHarness, LinqError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| LinqError::storage("cannot create temp dir", e))?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Storage::open(&StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        })
        .await?;

        let provider = Arc::new(MockReplyProvider::with_replies(self.replies));
        let chat = ChatRecorder::new(
            storage.memory.clone(),
            storage.preferences.clone(),
            provider.clone(),
            Arc::new(PlainPromptBuilder),
            &self.chat,
        );

        Ok(TestHarness {
            miner: Miner::new(storage.memory.clone(), storage.preferences.clone()),
            rules: Arc::new(RuleBook::fixed(self.rules)),
            storage,
            provider,
            chat,
            _temp_dir: temp_dir,
        })
    }
}

/// Stores, miner, and chat recorder over a temp database.
pub struct TestHarness {
    pub storage: Storage,
    pub miner: Miner,
    pub rules: Arc<RuleBook>,
    pub provider: Arc<MockReplyProvider>,
    pub chat: ChatRecorder,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Append turns directly, bypassing the reply collaborator.
    pub async fn seed_turns(&self, inputs: &[&str]) -> Result<(), LinqError> {
        for input in inputs {
            self.storage.memory.append(input, "好的").await?;
        }
        Ok(())
    }

    /// Run one mining pass with the current rules.
    pub async fn mine(&self) -> Result<MiningReport, LinqError> {
        let rules = self.rules.current();
        self.miner.run(&rules, &CancellationToken::new()).await
    }
}
