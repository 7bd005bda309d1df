// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `linq-core::types` so that the miner
//! and collaborators share them. This module re-exports them for convenience
//! within the storage crate.

pub use linq_core::types::{
    ConversationTurn, EventId, EventTime, FactId, InsertOutcome, NewPreference, PreferenceFact,
    ScheduledEvent, TurnId,
};
