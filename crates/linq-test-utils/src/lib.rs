// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Linq integration tests.
//!
//! Provides a scripted reply collaborator and a harness over a temp
//! database, for fast deterministic tests without a running model.
//!
//! # Components
//!
//! - [`MockReplyProvider`] - Reply collaborator with queued replies and failures
//! - [`TestHarness`] - Stores, miner, and chat recorder over a temp SQLite file

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::{MockReply, MockReplyProvider};
