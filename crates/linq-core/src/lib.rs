// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Linq memory engine.
//!
//! This crate provides the entity model (conversation turns, preference
//! facts, scheduled events), the error taxonomy, and the collaborator traits
//! used throughout the Linq workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LinqError;
pub use types::{
    ConversationTurn, EventId, EventTime, FactId, InsertOutcome, NewPreference, PreferenceFact,
    PromptInputs, ScheduledEvent, StoreKind, TurnId,
};

pub use traits::{PromptBuilder, ReplyProvider};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linq_error_variants_render_a_cause() {
        let storage = LinqError::storage("cannot open linq.db", std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage unavailable: cannot open linq.db");
        assert!(std::error::Error::source(&storage).is_some());

        let not_found = LinqError::NotFound {
            entity: "schedule",
            id: 7,
        };
        assert_eq!(not_found.to_string(), "schedule 7 not found");

        let validation = LinqError::Validation("bad time".into());
        assert_eq!(validation.to_string(), "validation error: bad time");

        let timeout = LinqError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(timeout.to_string().contains("30s"));
    }

    #[test]
    fn recoverable_errors_are_per_record() {
        assert!(LinqError::Validation("x".into()).is_recoverable());
        assert!(LinqError::NotFound { entity: "turn", id: 1 }.is_recoverable());
        assert!(!LinqError::Internal("x".into()).is_recoverable());
        assert!(
            !LinqError::StorageUnavailable {
                message: "x".into(),
                source: None
            }
            .is_recoverable()
        );
    }

    #[test]
    fn collaborator_traits_are_object_safe() {
        fn _assert_reply(_: &dyn ReplyProvider) {}
        fn _assert_prompt(_: &dyn PromptBuilder) {}
    }
}
