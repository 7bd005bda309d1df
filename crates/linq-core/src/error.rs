// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Linq memory engine.

use thiserror::Error;

/// The primary error type used across stores, the miner, and collaborators.
///
/// A duplicate preference insert is deliberately absent here: it is a
/// successful outcome and is reported through [`crate::types::InsertOutcome`].
#[derive(Debug, Error)]
pub enum LinqError {
    /// The durable medium could not be opened, read, or written.
    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input rejected before it reached storage (bad schedule time,
    /// malformed import record, empty event name).
    #[error("validation error: {0}")]
    Validation(String),

    /// Lookup or delete by id found no matching row.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Rule file or configuration problems.
    #[error("configuration error: {0}")]
    Config(String),

    /// The AI-reply collaborator failed.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LinqError {
    /// Wraps a backend error as [`LinqError::StorageUnavailable`] with context.
    pub fn storage(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LinqError::StorageUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true for errors that reject a single record without
    /// implicating the store (safe to skip and continue a batch).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinqError::Validation(_) | LinqError::NotFound { .. })
    }
}
