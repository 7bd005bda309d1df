// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule reminders.
//!
//! Lists the day's events, asks the reply collaborator for a short
//! encouraging note informed by the memory digest, and records the exchange
//! as a conversation turn. When the collaborator is unavailable a canned
//! reminder chosen from the event names is used.

use std::time::Duration;

use linq_core::{LinqError, ReplyProvider, ScheduledEvent, TurnId};
use linq_storage::{MemoryStore, PreferenceStore, ScheduleStore};
use tracing::warn;

use crate::chat::reply_within;
use crate::renderer;

const STUDY_WORDS: [&str; 3] = ["学习", "数学", "英语"];
const EXERCISE_WORDS: [&str; 2] = ["运动", "健身"];

const STUDY_REMINDER: &str = "学习时间到！坚持就是胜利，开始今天的知识探索吧！💪";
const EXERCISE_REMINDER: &str = "运动时间到！身体健康最重要，动起来吧！🏃‍♂️";
const GENERIC_REMINDER: &str = "该完成计划的任务了！一步一个脚印，加油！✨";

/// A generated reminder and where it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub text: String,
    /// The bullet list of events the reminder covers.
    pub schedule_text: String,
    pub turn_id: TurnId,
    pub used_fallback: bool,
}

/// `• HH:MM - name` per event, one per line.
pub fn schedule_text(events: &[ScheduledEvent]) -> String {
    events
        .iter()
        .map(|e| format!("• {} - {}", e.event_time, e.event_name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn reminder_prompt(schedule_text: &str, digest: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(digest) = digest {
        parts.push(digest.to_string());
    }
    parts.push(format!("今日行程安排：{schedule_text}"));
    parts.push("请根据以上信息生成一个简短的提醒，温暖地鼓励并监督用户：".to_string());
    parts.join("\n")
}

/// Canned reminder keyed on what the schedule mentions.
pub fn fallback_reminder(schedule_text: &str) -> &'static str {
    if STUDY_WORDS.iter().any(|w| schedule_text.contains(w)) {
        STUDY_REMINDER
    } else if EXERCISE_WORDS.iter().any(|w| schedule_text.contains(w)) {
        EXERCISE_REMINDER
    } else {
        GENERIC_REMINDER
    }
}

/// Produce a reminder for the current schedule. `Ok(None)` when it is empty.
pub async fn remind(
    schedules: &ScheduleStore,
    preferences: &PreferenceStore,
    memory: &MemoryStore,
    provider: &dyn ReplyProvider,
    timeout: Duration,
) -> Result<Option<Reminder>, LinqError> {
    let events = schedules.list().await?;
    if events.is_empty() {
        return Ok(None);
    }
    let listing = schedule_text(&events);
    let facts = preferences.all_facts().await?;
    let digest = renderer::digest_or_none(&facts);
    let prompt = reminder_prompt(&listing, digest.as_deref());

    let (text, used_fallback) = match reply_within(provider, &prompt, timeout).await {
        Ok(text) if !text.trim().is_empty() => (text, false),
        Ok(_) => (fallback_reminder(&listing).to_string(), true),
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "reminder generation failed");
            (fallback_reminder(&listing).to_string(), true)
        }
    };

    let turn_id = memory
        .append(&format!("检查行程: {listing}"), &text)
        .await?;
    Ok(Some(Reminder {
        text,
        schedule_text: listing,
        turn_id,
        used_fallback,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linq_storage::{Database, Storage};

    struct Fixed(&'static str);

    #[async_trait]
    impl ReplyProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn reply(&self, _prompt: &str) -> Result<String, LinqError> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    #[async_trait]
    impl ReplyProvider for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn reply(&self, _prompt: &str) -> Result<String, LinqError> {
            Err(LinqError::Provider {
                message: "offline".into(),
                source: None,
            })
        }
    }

    #[test]
    fn fallback_picks_by_keyword() {
        assert_eq!(fallback_reminder("• 09:00 - 数学作业"), STUDY_REMINDER);
        assert_eq!(fallback_reminder("• 18:00 - 健身房"), EXERCISE_REMINDER);
        assert_eq!(fallback_reminder("• 12:00 - 午饭"), GENERIC_REMINDER);
        // Study wins when both appear.
        assert_eq!(fallback_reminder("运动后学习"), STUDY_REMINDER);
    }

    #[test]
    fn prompt_skips_missing_digest() {
        let p = reminder_prompt("• 08:00 - 晨跑", None);
        assert!(p.starts_with("今日行程安排：• 08:00 - 晨跑"));
        let p = reminder_prompt("• 08:00 - 晨跑", Some("以下是你已知的关于用户的信息：\n- 用户经常跑步\n"));
        assert!(p.starts_with("以下是你已知的关于用户的信息"));
    }

    #[tokio::test]
    async fn empty_schedule_yields_none() {
        let s = Storage::from_database(Database::open_in_memory().await.unwrap());
        let r = remind(&s.schedules, &s.preferences, &s.memory, &Fixed("hi"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(r.is_none());
        assert_eq!(s.memory.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reminder_is_recorded_as_turn() {
        let s = Storage::from_database(Database::open_in_memory().await.unwrap());
        s.schedules.add("19:00", "英语").await.unwrap();
        s.schedules.add("07:00", "晨跑").await.unwrap();

        let r = remind(&s.schedules, &s.preferences, &s.memory, &Fixed("加油！"), Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.schedule_text, "• 07:00 - 晨跑\n• 19:00 - 英语");
        assert_eq!(r.text, "加油！");
        assert!(!r.used_fallback);

        let turns = s.memory.all_turns().await.unwrap();
        assert_eq!(turns[0].user_input, "检查行程: • 07:00 - 晨跑\n• 19:00 - 英语");
        assert_eq!(turns[0].ai_output, "加油！");
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback() {
        let s = Storage::from_database(Database::open_in_memory().await.unwrap());
        s.schedules.add("18:00", "健身").await.unwrap();
        let r = remind(&s.schedules, &s.preferences, &s.memory, &Down, Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert!(r.used_fallback);
        assert_eq!(r.text, EXERCISE_REMINDER);
    }
}
