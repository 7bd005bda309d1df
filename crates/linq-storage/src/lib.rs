// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Linq memory engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for the
//! conversation log, the deduplicated preference set, and the schedule.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod stores;

pub use database::Database;
pub use models::*;
pub use stores::{MemoryStore, PreferenceStore, ScheduleStore, Storage};
