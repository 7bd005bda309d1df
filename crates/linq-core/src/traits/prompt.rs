// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt-builder collaborator trait.

use crate::types::PromptInputs;

/// Turns the memory digest, recent history, and new input into a prompt.
///
/// The core has no opinion on formatting beyond supplying [`PromptInputs`].
pub trait PromptBuilder: Send + Sync {
    fn build(&self, inputs: &PromptInputs) -> String;
}
