// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preference mining and memory rendering for the Linq memory engine.
//!
//! ## Architecture
//!
//! - **RuleSet / RuleBook**: ordered keyword rules, hot-swappable via `ArcSwap`
//! - **Miner**: applies the rules to every stored turn, inserting new facts
//! - **Renderer**: turns the preference store into a prompt-ready digest
//! - **Interchange**: JSON import/export for all three stores
//! - **Prompt / ChatRecorder**: prompt inputs and the reply-then-record loop
//! - **Reminder**: schedule reminders with a rule-based fallback

pub mod chat;
pub mod interchange;
pub mod miner;
pub mod prompt;
pub mod reminder;
pub mod renderer;
pub mod rules;

pub use chat::{ChatOutcome, ChatRecorder};
pub use interchange::ImportReport;
pub use miner::{extract_candidate, spawn_mining_pass, Candidate, Miner, MiningReport};
pub use prompt::{prompt_inputs, PlainPromptBuilder, HISTORY_WINDOW};
pub use renderer::{render, Phrasing, NO_PREFERENCES};
pub use rules::{RuleBook, RuleSet, RuleWatcher};
