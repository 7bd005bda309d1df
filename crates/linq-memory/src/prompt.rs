// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of [`PromptInputs`] and a plain-text [`PromptBuilder`].

use linq_core::{LinqError, PromptBuilder, PromptInputs};
use linq_storage::{MemoryStore, PreferenceStore};

use crate::renderer;

/// Number of past turns included in a prompt by default.
pub const HISTORY_WINDOW: usize = 4;

/// Gather the digest, the last `history_window` turns, and `user_input`.
pub async fn prompt_inputs(
    memory: &MemoryStore,
    preferences: &PreferenceStore,
    user_input: &str,
    history_window: usize,
) -> Result<PromptInputs, LinqError> {
    let facts = preferences.all_facts().await?;
    let history = memory.recent_turns(history_window).await?;
    Ok(PromptInputs {
        memory_digest: renderer::digest_or_none(&facts),
        history,
        user_input: user_input.to_string(),
    })
}

/// Digest, dialogue history, an instruction line, then the new input.
#[derive(Debug, Clone, Default)]
pub struct PlainPromptBuilder;

impl PromptBuilder for PlainPromptBuilder {
    fn build(&self, inputs: &PromptInputs) -> String {
        let mut prompt = String::new();
        if let Some(digest) = &inputs.memory_digest {
            prompt.push_str(digest);
            prompt.push('\n');
        }
        if !inputs.history.is_empty() {
            prompt.push_str("当前对话历史：\n");
            for turn in &inputs.history {
                prompt.push_str(&format!("用户: {}\n", turn.user_input));
                prompt.push_str(&format!("AI: {}\n", turn.ai_output));
            }
            prompt.push('\n');
        }
        prompt.push_str("请根据以上已知信息，自然地与用户对话。如果信息相关，请在回复中体现出来。\n");
        prompt.push_str(&format!("用户: {}\nAI: ", inputs.user_input));
        prompt
    }
}
