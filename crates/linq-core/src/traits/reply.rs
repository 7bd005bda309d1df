// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI-reply collaborator trait (local LLM client, remote API, etc.).

use async_trait::async_trait;

use crate::error::LinqError;

/// Produces an assistant reply for a fully assembled prompt.
///
/// Implementations own the network. Timeouts are enforced by the caller,
/// so a slow implementation simply never resolves in time.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Returns the reply text for `prompt`.
    async fn reply(&self, prompt: &str) -> Result<String, LinqError>;
}
