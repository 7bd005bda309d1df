// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-driven preference mining over the conversation log.
//!
//! Each turn commits to the first keyword (categories in declared order,
//! keywords in declared order) found as a substring of the user input. The
//! text after that keyword becomes the fact. A pass can be repeated freely:
//! the preference store drops pairs it already holds, so only genuinely new
//! facts are counted.

use std::sync::Arc;

use linq_core::{ConversationTurn, LinqError, NewPreference, TurnId};
use linq_storage::{MemoryStore, PreferenceStore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::rules::{RuleBook, RuleSet};

/// Longest extracted value, in characters.
pub const MAX_EXTRACTED_CHARS: usize = 20;

/// Characters that end an extracted phrase.
const PHRASE_TERMINATORS: [char; 3] = ['。', '，', ' '];

/// Keyword fragments that mark a `fact` keyword as introducing the user's name.
const NAME_MARKERS: [&str; 3] = ["名字", "叫我", "我叫"];

/// Key under which the user's name is stored.
pub const USER_NAME_KEY: &str = "user_name";

/// What a single turn yields before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub category: String,
    /// Keyword that matched.
    pub keyword: String,
    pub key: String,
    pub value: String,
}

impl Candidate {
    pub fn into_preference(self, source_turn_id: Option<TurnId>) -> NewPreference {
        NewPreference {
            category: self.category,
            key: self.key,
            value: self.value,
            source_turn_id,
        }
    }
}

/// Apply `rules` to one user input.
///
/// Returns `None` when no keyword occurs, or when the first matching keyword
/// has nothing usable after it. Later keywords are never consulted once one
/// has matched.
pub fn extract_candidate(rules: &RuleSet, user_input: &str) -> Option<Candidate> {
    for (category, keywords) in rules.iter() {
        for keyword in keywords {
            let Some(pos) = user_input.find(keyword.as_str()) else {
                continue;
            };
            let tail = user_input[pos + keyword.len()..].trim();
            let extracted = first_phrase(tail);
            if extracted.is_empty() {
                return None;
            }

            let (key, value) = if category == "fact" && is_name_keyword(keyword) {
                (USER_NAME_KEY.to_string(), extracted)
            } else {
                (extracted, keyword.clone())
            };
            return Some(Candidate {
                category: category.to_string(),
                keyword: keyword.clone(),
                key,
                value,
            });
        }
    }
    None
}

fn first_phrase(tail: &str) -> String {
    let end = tail.find(PHRASE_TERMINATORS).unwrap_or(tail.len());
    tail[..end].chars().take(MAX_EXTRACTED_CHARS).collect()
}

fn is_name_keyword(keyword: &str) -> bool {
    NAME_MARKERS.iter().any(|marker| keyword.contains(marker))
}

/// Outcome of one mining pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningReport {
    /// Facts actually inserted (duplicates excluded).
    pub new_facts: usize,
    pub turns_scanned: usize,
    /// Turns that produced a candidate, new or not.
    pub matched_turns: usize,
    /// The pass stopped early on cancellation.
    pub cancelled: bool,
    pub summary: String,
}

impl MiningReport {
    fn finish(new_facts: usize, turns_scanned: usize, matched_turns: usize, cancelled: bool) -> Self {
        let summary = if turns_scanned == 0 && !cancelled {
            "no turns to analyze".to_string()
        } else if new_facts == 0 {
            "no new preferences found".to_string()
        } else {
            format!("mined {new_facts} new preferences")
        };
        Self {
            new_facts,
            turns_scanned,
            matched_turns,
            cancelled,
            summary,
        }
    }

    /// `(count, summary)` form.
    pub fn as_tuple(&self) -> (usize, &str) {
        (self.new_facts, &self.summary)
    }
}

/// Runs mining passes from the memory store into the preference store.
#[derive(Debug, Clone)]
pub struct Miner {
    memory: MemoryStore,
    preferences: PreferenceStore,
}

impl Miner {
    pub fn new(memory: MemoryStore, preferences: PreferenceStore) -> Self {
        Self {
            memory,
            preferences,
        }
    }

    /// Scan every stored turn once with `rules`.
    ///
    /// Each fact is committed on its own; a cancelled pass keeps what it
    /// already inserted. Insert failures for one turn are logged and the pass
    /// moves on. Only failing to read the turn log aborts the pass.
    pub async fn run(
        &self,
        rules: &RuleSet,
        cancel: &CancellationToken,
    ) -> Result<MiningReport, LinqError> {
        let turns = self.memory.all_turns().await?;
        if turns.is_empty() {
            let report = MiningReport::finish(0, 0, 0, false);
            info!(summary = %report.summary, "mining pass finished");
            return Ok(report);
        }

        let mut new_facts = 0;
        let mut scanned = 0;
        let mut matched = 0;
        let mut cancelled = false;

        for turn in &turns {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            scanned += 1;
            match self.mine_turn(rules, turn).await {
                Ok(Some(inserted)) => {
                    matched += 1;
                    if inserted {
                        new_facts += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(turn_id = turn.id, error = %e, "skipping turn");
                }
            }
        }

        let report = MiningReport::finish(new_facts, scanned, matched, cancelled);
        info!(
            new_facts = report.new_facts,
            turns_scanned = report.turns_scanned,
            matched_turns = report.matched_turns,
            cancelled = report.cancelled,
            summary = %report.summary,
            "mining pass finished"
        );
        Ok(report)
    }

    /// `Some(true)` for a new fact, `Some(false)` for a duplicate, `None` when
    /// the turn yields nothing.
    async fn mine_turn(
        &self,
        rules: &RuleSet,
        turn: &ConversationTurn,
    ) -> Result<Option<bool>, LinqError> {
        let Some(candidate) = extract_candidate(rules, &turn.user_input) else {
            return Ok(None);
        };
        debug!(
            turn_id = turn.id,
            category = %candidate.category,
            keyword = %candidate.keyword,
            "candidate extracted"
        );
        let outcome = self
            .preferences
            .insert_if_absent(&candidate.into_preference(Some(turn.id)))
            .await?;
        Ok(Some(outcome.is_inserted()))
    }
}

/// Run one pass on a background task with the rules current at spawn time.
pub fn spawn_mining_pass(
    miner: Miner,
    book: &RuleBook,
    cancel: CancellationToken,
) -> JoinHandle<Result<MiningReport, LinqError>> {
    let rules: Arc<RuleSet> = book.current();
    tokio::spawn(async move { miner.run(&rules, &cancel).await })
}
