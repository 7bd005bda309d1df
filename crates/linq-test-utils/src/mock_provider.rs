// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply collaborator for deterministic testing.
//!
//! `MockReplyProvider` implements `ReplyProvider` with a FIFO script of
//! replies, failures, and stalls, and records every prompt it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use linq_core::{LinqError, ReplyProvider};
use tokio::sync::Mutex;

/// One scripted step.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fail with a provider error carrying this message.
    Fail(String),
    /// Never resolve; exercises the caller's timeout.
    Stall,
}

/// A reply collaborator that plays back a script.
///
/// When the script is exhausted, "mock reply" is returned.
#[derive(Debug, Clone, Default)]
pub struct MockReplyProvider {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockReplyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load text replies.
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into_iter().map(MockReply::Text).collect())),
            prompts: Arc::default(),
        }
    }

    /// Append a step to the script.
    pub async fn push(&self, step: MockReply) {
        self.script.lock().await.push_back(step);
    }

    /// Every prompt received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ReplyProvider for MockReplyProvider {
    fn name(&self) -> &str {
        "mock-reply"
    }

    async fn reply(&self, prompt: &str) -> Result<String, LinqError> {
        self.prompts.lock().await.push(prompt.to_string());
        let step = self.script.lock().await.pop_front();
        match step {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(message)) => Err(LinqError::Provider {
                message,
                source: None,
            }),
            Some(MockReply::Stall) => {
                std::future::pending::<()>().await;
                Err(LinqError::Internal("stalled reply resolved".to_string()))
            }
            None => Ok("mock reply".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_reply_when_script_empty() {
        let provider = MockReplyProvider::new();
        assert_eq!(provider.reply("hi").await.unwrap(), "mock reply");
    }

    #[tokio::test]
    async fn scripted_steps_play_in_order() {
        let provider = MockReplyProvider::with_replies(vec!["first".into()]);
        provider.push(MockReply::Fail("down".into())).await;
        provider.push(MockReply::Text("third".into())).await;

        assert_eq!(provider.reply("a").await.unwrap(), "first");
        assert!(matches!(
            provider.reply("b").await,
            Err(LinqError::Provider { .. })
        ));
        assert_eq!(provider.reply("c").await.unwrap(), "third");
        assert_eq!(provider.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stall_never_resolves() {
        let provider = MockReplyProvider::new();
        provider.push(MockReply::Stall).await;
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            provider.reply("wait"),
        )
        .await;
        assert!(result.is_err());
    }
}
