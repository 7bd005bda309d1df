// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity types shared by the stores, the miner, and the collaborators.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::LinqError;

/// Surrogate key of a [`ConversationTurn`].
pub type TurnId = i64;

/// Surrogate key of a [`PreferenceFact`].
pub type FactId = i64;

/// Surrogate key of a [`ScheduledEvent`].
pub type EventId = i64;

/// One completed user/assistant exchange. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub user_input: String,
    pub ai_output: String,
    /// ISO 8601 timestamp assigned by the storage layer.
    pub created_at: String,
}

/// A structured fact derived from conversation text or imported.
///
/// `(key, value)` is unique across the preference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceFact {
    pub id: FactId,
    pub category: String,
    pub key: String,
    pub value: String,
    /// Turn this fact was mined from. Provenance only, not ownership.
    pub source_turn_id: Option<TurnId>,
}

/// A preference waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPreference {
    pub category: String,
    pub key: String,
    pub value: String,
    pub source_turn_id: Option<TurnId>,
}

/// Result of a deduplicating insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// The `(key, value)` pair already existed; nothing changed.
    DuplicateIgnored,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// A timed event on the user's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: EventId,
    pub event_time: EventTime,
    pub event_name: String,
    pub created_at: String,
}

/// A validated 24-hour wall-clock time, always rendered as zero-padded `HH:MM`.
///
/// Zero padding makes lexical order of the stored text equal chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime(NaiveTime);

impl EventTime {
    /// Parses `HH:MM` (hours 00-23, minutes 00-59).
    pub fn parse(input: &str) -> Result<Self, LinqError> {
        let trimmed = input.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(EventTime)
            .map_err(|_| {
                LinqError::Validation(format!(
                    "invalid event time `{trimmed}`: expected HH:MM in 24-hour format, e.g. 14:30"
                ))
            })
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl std::str::FromStr for EventTime {
    type Err = LinqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventTime::parse(s)
    }
}

impl Serialize for EventTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EventTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Identifies one of the three independently durable stores.
///
/// Used by the import/export surface to route records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[strum(to_string = "conversation", serialize = "memory")]
    Conversation,
    #[strum(to_string = "preference", serialize = "preferences")]
    Preference,
    #[strum(to_string = "schedule", serialize = "schedules")]
    Schedule,
}

/// The three pieces handed to the prompt-builder collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInputs {
    /// Rendered preference digest; `None` when nothing has been recorded yet.
    pub memory_digest: Option<String>,
    /// The most recent exchanges, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The new user input.
    pub user_input: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn event_time_accepts_valid_24_hour_times() {
        assert_eq!(EventTime::parse("00:00").unwrap().to_string(), "00:00");
        assert_eq!(EventTime::parse("14:30").unwrap().to_string(), "14:30");
        assert_eq!(EventTime::parse(" 23:59 ").unwrap().to_string(), "23:59");
    }

    #[test]
    fn event_time_rejects_out_of_range_and_garbage() {
        for bad in ["25:00", "24:00", "12:60", "noon", "", "12", "12:30:15"] {
            let err = EventTime::parse(bad).unwrap_err();
            assert!(
                matches!(err, LinqError::Validation(_)),
                "`{bad}` should be a validation error, got {err:?}"
            );
        }
    }

    #[test]
    fn event_time_orders_chronologically() {
        let early = EventTime::parse("08:05").unwrap();
        let late = EventTime::parse("21:00").unwrap();
        assert!(early < late);
    }

    #[test]
    fn event_time_serde_uses_text_form() {
        let t = EventTime::parse("09:15").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"09:15\"");
        let back: EventTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<EventTime>("\"25:00\"").is_err());
    }

    #[test]
    fn store_kind_parses_aliases_case_insensitively() {
        assert_eq!(StoreKind::from_str("memory").unwrap(), StoreKind::Conversation);
        assert_eq!(StoreKind::from_str("Conversation").unwrap(), StoreKind::Conversation);
        assert_eq!(StoreKind::from_str("preferences").unwrap(), StoreKind::Preference);
        assert_eq!(StoreKind::from_str("SCHEDULE").unwrap(), StoreKind::Schedule);
        assert!(StoreKind::from_str("calendar").is_err());
        assert_eq!(StoreKind::Preference.to_string(), "preference");
    }

    #[test]
    fn insert_outcome_reports_insertion() {
        assert!(InsertOutcome::Inserted.is_inserted());
        assert!(!InsertOutcome::DuplicateIgnored.is_inserted());
    }

    proptest::proptest! {
        #[test]
        fn every_valid_hour_minute_pair_parses(h in 0u32..24, m in 0u32..60) {
            let text = format!("{h:02}:{m:02}");
            let parsed = EventTime::parse(&text).unwrap();
            proptest::prop_assert_eq!(parsed.to_string(), text);
        }
    }
}
