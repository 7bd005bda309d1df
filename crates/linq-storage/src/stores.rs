// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store handles over the shared database.
//!
//! Each handle is a cheap clone of [`Database`] scoped to one table, so the
//! miner, the chat loop, and the CLI can hold whichever stores they need
//! while every statement still goes through the single background writer.

use linq_config::model::StorageConfig;
use linq_core::LinqError;
use tracing::info;

use crate::database::Database;
use crate::models::{
    ConversationTurn, EventId, EventTime, InsertOutcome, NewPreference, PreferenceFact,
    ScheduledEvent, TurnId,
};
use crate::queries::{preferences, schedules, turns};

/// Append-only log of conversation turns.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    db: Database,
}

impl MemoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn append(&self, user_input: &str, ai_output: &str) -> Result<TurnId, LinqError> {
        turns::append(&self.db, user_input, ai_output).await
    }

    pub async fn append_with_timestamp(
        &self,
        user_input: &str,
        ai_output: &str,
        created_at: &str,
    ) -> Result<TurnId, LinqError> {
        turns::append_with_timestamp(&self.db, user_input, ai_output, created_at).await
    }

    pub async fn all_turns(&self) -> Result<Vec<ConversationTurn>, LinqError> {
        turns::all_turns(&self.db).await
    }

    pub async fn recent_turns(&self, limit: usize) -> Result<Vec<ConversationTurn>, LinqError> {
        turns::recent_turns(&self.db, limit).await
    }

    pub async fn count(&self) -> Result<u64, LinqError> {
        turns::count(&self.db).await
    }
}

/// Deduplicated set of preference facts.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    db: Database,
}

impl PreferenceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert_if_absent(&self, pref: &NewPreference) -> Result<InsertOutcome, LinqError> {
        preferences::insert_if_absent(&self.db, pref).await
    }

    pub async fn all_facts(&self) -> Result<Vec<PreferenceFact>, LinqError> {
        preferences::all_facts(&self.db).await
    }

    pub async fn count(&self) -> Result<u64, LinqError> {
        preferences::count(&self.db).await
    }
}

/// Timed events, written directly by the front-end.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    db: Database,
}

impl ScheduleStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn add(&self, event_time: &str, event_name: &str) -> Result<EventId, LinqError> {
        schedules::add(&self.db, event_time, event_name).await
    }

    pub async fn add_with_timestamp(
        &self,
        event_time: EventTime,
        event_name: &str,
        created_at: &str,
    ) -> Result<EventId, LinqError> {
        schedules::add_with_timestamp(&self.db, event_time, event_name, created_at).await
    }

    pub async fn list(&self) -> Result<Vec<ScheduledEvent>, LinqError> {
        schedules::list(&self.db).await
    }

    pub async fn get(&self, id: EventId) -> Result<Option<ScheduledEvent>, LinqError> {
        schedules::get(&self.db, id).await
    }

    pub async fn delete(&self, id: EventId) -> Result<ScheduledEvent, LinqError> {
        schedules::delete(&self.db, id).await
    }
}

/// The three stores opened over one database.
#[derive(Debug, Clone)]
pub struct Storage {
    db: Database,
    pub memory: MemoryStore,
    pub preferences: PreferenceStore,
    pub schedules: ScheduleStore,
}

impl Storage {
    /// Open the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, LinqError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        info!(path = %config.database_path, "storage ready");
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            memory: MemoryStore::new(db.clone()),
            preferences: PreferenceStore::new(db.clone()),
            schedules: ScheduleStore::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Flush the WAL and close the connection shared by all three stores.
    pub async fn close(self) -> Result<(), LinqError> {
        self.db.close().await
    }
}
