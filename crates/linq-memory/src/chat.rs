// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One chat exchange: build the prompt, get a reply, record the turn.
//!
//! The reply collaborator is never allowed to lose a turn. If it errors or
//! exceeds the timeout, the configured fallback text is recorded and shown
//! instead.

use std::sync::Arc;
use std::time::Duration;

use linq_config::model::ChatConfig;
use linq_core::{LinqError, PromptBuilder, ReplyProvider, TurnId};
use linq_storage::{MemoryStore, PreferenceStore};
use tracing::{debug, warn};

use crate::prompt::prompt_inputs;

/// Call `provider` with an upper bound on how long it may take.
pub async fn reply_within(
    provider: &dyn ReplyProvider,
    prompt: &str,
    limit: Duration,
) -> Result<String, LinqError> {
    match tokio::time::timeout(limit, provider.reply(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(LinqError::Timeout { duration: limit }),
    }
}

/// What one exchange produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub turn_id: TurnId,
    pub reply: String,
    /// The collaborator failed and the fallback text was used.
    pub used_fallback: bool,
}

/// Wires the reply and prompt collaborators to the memory store.
pub struct ChatRecorder {
    memory: MemoryStore,
    preferences: PreferenceStore,
    provider: Arc<dyn ReplyProvider>,
    builder: Arc<dyn PromptBuilder>,
    history_window: usize,
    reply_timeout: Duration,
    fallback_reply: String,
}

impl ChatRecorder {
    pub fn new(
        memory: MemoryStore,
        preferences: PreferenceStore,
        provider: Arc<dyn ReplyProvider>,
        builder: Arc<dyn PromptBuilder>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            memory,
            preferences,
            provider,
            builder,
            history_window: config.history_window,
            reply_timeout: Duration::from_secs(config.reply_timeout_secs),
            fallback_reply: config.fallback_reply.clone(),
        }
    }

    /// Answer `user_input` and append the exchange to the memory store.
    ///
    /// Only storage failures are returned as errors.
    pub async fn respond(&self, user_input: &str) -> Result<ChatOutcome, LinqError> {
        let inputs = prompt_inputs(
            &self.memory,
            &self.preferences,
            user_input,
            self.history_window,
        )
        .await?;
        let prompt = self.builder.build(&inputs);
        debug!(
            provider = self.provider.name(),
            prompt_chars = prompt.chars().count(),
            "requesting reply"
        );

        let (reply, used_fallback) =
            match reply_within(self.provider.as_ref(), &prompt, self.reply_timeout).await {
                Ok(text) => (text, false),
                Err(e) => {
                    warn!(provider = self.provider.name(), error = %e, "reply failed, using fallback");
                    (self.fallback_reply.clone(), true)
                }
            };

        let turn_id = self.memory.append(user_input, &reply).await?;
        Ok(ChatOutcome {
            turn_id,
            reply,
            used_fallback,
        })
    }
}

impl std::fmt::Debug for ChatRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRecorder")
            .field("provider", &self.provider.name())
            .field("history_window", &self.history_window)
            .field("reply_timeout", &self.reply_timeout)
            .finish_non_exhaustive()
    }
}
