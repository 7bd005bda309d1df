// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the core consumes but does not implement.
//!
//! The chat client and the prompt formatter live outside the core; these
//! traits are the narrow seams through which the core talks to them.

pub mod prompt;
pub mod reply;

pub use prompt::PromptBuilder;
pub use reply::ReplyProvider;
