// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the record, mine, render pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite file and a
//! scripted reply collaborator. Tests are independent and order-insensitive.

use std::collections::HashSet;

use linq_core::{LinqError, StoreKind};
use linq_memory::{interchange, render, RuleSet, NO_PREFERENCES};
use linq_test_utils::{MockReply, TestHarness};

// ---- Mining ----

#[tokio::test]
async fn test_second_mining_pass_finds_nothing_new() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_turns(&["我喜欢篮球", "我叫小明", "我经常跑步", "今天天气不错"])
        .await
        .unwrap();

    let first = harness.mine().await.unwrap();
    assert_eq!(first.new_facts, 3);
    assert_eq!(first.turns_scanned, 4);

    let second = harness.mine().await.unwrap();
    assert_eq!(second.new_facts, 0);
    assert_eq!(second.summary, "no new preferences found");
    assert_eq!(harness.storage.preferences.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_key_value_pairs_stay_unique() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_turns(&["我喜欢猫", "我也喜欢猫", "真的喜欢猫", "我喜欢狗"])
        .await
        .unwrap();
    harness.mine().await.unwrap();

    let facts = harness.storage.preferences.all_facts().await.unwrap();
    let pairs: HashSet<(&str, &str)> = facts
        .iter()
        .map(|f| (f.key.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(pairs.len(), facts.len());
    assert_eq!(facts.len(), 2);
}

#[tokio::test]
async fn test_first_matching_keyword_wins() {
    let rules = RuleSet::from_json(r#"{"fact":["我叫"],"like":["喜欢"]}"#).unwrap();
    let harness = TestHarness::builder().with_rules(rules).build().await.unwrap();
    harness.seed_turns(&["我叫小明，我喜欢篮球"]).await.unwrap();

    let report = harness.mine().await.unwrap();
    assert_eq!(report.new_facts, 1);

    let facts = harness.storage.preferences.all_facts().await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].category, "fact");
    assert_eq!(facts[0].key, "user_name");
    assert_eq!(facts[0].value, "小明");
}

#[tokio::test]
async fn test_keyword_with_empty_tail_is_abandoned() {
    let rules = RuleSet::from_json(r#"{"like":["喜欢","爱"]}"#).unwrap();
    let harness = TestHarness::builder().with_rules(rules).build().await.unwrap();
    // "喜欢" matches first with nothing after it; "爱" is not tried.
    harness.seed_turns(&["我爱猫也喜欢"]).await.unwrap();

    let report = harness.mine().await.unwrap();
    assert_eq!(report.new_facts, 0);
    assert_eq!(report.matched_turns, 0);
    assert_eq!(harness.storage.preferences.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_memory_reports_nothing_to_analyze() {
    let harness = TestHarness::builder().build().await.unwrap();
    let report = harness.mine().await.unwrap();
    assert_eq!(report.as_tuple(), (0, "no turns to analyze"));
}

// ---- Rendering ----

#[tokio::test]
async fn test_render_is_deterministic() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .seed_turns(&["我叫小明", "我喜欢篮球", "我经常跑步"])
        .await
        .unwrap();
    harness.mine().await.unwrap();

    let a = render(&harness.storage.preferences.all_facts().await.unwrap());
    let b = render(&harness.storage.preferences.all_facts().await.unwrap());
    assert_eq!(a, b);
    assert!(a.contains("小明"));
    assert!(a.contains("篮球"));
}

#[tokio::test]
async fn test_render_without_preferences() {
    let harness = TestHarness::builder().build().await.unwrap();
    let facts = harness.storage.preferences.all_facts().await.unwrap();
    assert_eq!(render(&facts), NO_PREFERENCES);
}

// ---- Schedule ----

#[tokio::test]
async fn test_invalid_event_time_leaves_schedule_untouched() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.storage.schedules.add("09:00", "晨会").await.unwrap();

    let err = harness.storage.schedules.add("25:00", "夜宵").await.unwrap_err();
    assert!(matches!(err, LinqError::Validation(_)));

    let events = harness.storage.schedules.list().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_name, "晨会");
}

#[tokio::test]
async fn test_deleting_unknown_event_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.storage.schedules.add("09:00", "晨会").await.unwrap();

    let err = harness.storage.schedules.delete(7).await.unwrap_err();
    assert!(matches!(err, LinqError::NotFound { .. }));
    assert_eq!(harness.storage.schedules.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_schedule_lists_in_time_order() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.storage.schedules.add("18:30", "跑步").await.unwrap();
    harness.storage.schedules.add("08:00", "早饭").await.unwrap();
    harness.storage.schedules.add("12:00", "午饭").await.unwrap();

    let names: Vec<String> = harness
        .storage
        .schedules
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_name)
        .collect();
    assert_eq!(names, ["早饭", "午饭", "跑步"]);
}

// ---- Interchange ----

#[tokio::test]
async fn test_export_then_import_reproduces_stores() {
    let source = TestHarness::builder().build().await.unwrap();
    source.seed_turns(&["我喜欢篮球", "我叫小明"]).await.unwrap();
    source.mine().await.unwrap();
    source.storage.schedules.add("10:00", "开会").await.unwrap();

    let target = TestHarness::builder().build().await.unwrap();
    for kind in [StoreKind::Conversation, StoreKind::Preference, StoreKind::Schedule] {
        let exported = interchange::export_records(&source.storage, kind).await.unwrap();
        let records = exported.as_array().unwrap().clone();
        let report = interchange::import_records(&target.storage, kind, records)
            .await
            .unwrap();
        assert!(report.rejected.is_empty(), "{kind}: {:?}", report.rejected);
    }

    let turns: Vec<_> = target
        .storage
        .memory
        .all_turns()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.user_input)
        .collect();
    assert_eq!(turns, ["我喜欢篮球", "我叫小明"]);

    let src_facts = source.storage.preferences.all_facts().await.unwrap();
    let dst_facts = target.storage.preferences.all_facts().await.unwrap();
    assert_eq!(render(&src_facts), render(&dst_facts));

    let events = target.storage.schedules.list().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_time.to_string(), "10:00");
}

#[tokio::test]
async fn test_reimporting_preferences_counts_duplicates() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.seed_turns(&["我喜欢篮球"]).await.unwrap();
    harness.mine().await.unwrap();

    let exported = interchange::export_records(&harness.storage, StoreKind::Preference)
        .await
        .unwrap();
    let records = exported.as_array().unwrap().clone();
    let report = interchange::import_records(&harness.storage, StoreKind::Preference, records)
        .await
        .unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.duplicates, 1);
    assert_eq!(harness.storage.preferences.count().await.unwrap(), 1);
}

// ---- Chat ----

#[tokio::test]
async fn test_chat_turns_feed_the_miner() {
    let harness = TestHarness::builder()
        .with_replies(vec!["篮球很棒！".to_string()])
        .build()
        .await
        .unwrap();

    let outcome = harness.chat.respond("我喜欢篮球").await.unwrap();
    assert_eq!(outcome.reply, "篮球很棒！");
    assert!(!outcome.used_fallback);

    let report = harness.mine().await.unwrap();
    assert_eq!(report.new_facts, 1);
}

#[tokio::test]
async fn test_failed_reply_records_fallback() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .provider
        .push(MockReply::Fail("model offline".to_string()))
        .await;

    let outcome = harness.chat.respond("你好").await.unwrap();
    assert!(outcome.used_fallback);

    let turns = harness.storage.memory.all_turns().await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].ai_output, outcome.reply);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_reply_times_out_to_fallback() {
    let harness = TestHarness::builder()
        .with_reply_timeout_secs(5)
        .build()
        .await
        .unwrap();
    harness.provider.push(MockReply::Stall).await;

    let outcome = harness.chat.respond("在吗").await.unwrap();
    assert!(outcome.used_fallback);
    assert_eq!(harness.storage.memory.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_prompt_carries_known_preferences() {
    let harness = TestHarness::builder()
        .with_replies(vec!["好的".to_string()])
        .build()
        .await
        .unwrap();
    harness.seed_turns(&["我叫小明"]).await.unwrap();
    harness.mine().await.unwrap();

    harness.chat.respond("今天做什么").await.unwrap();
    let prompts = harness.provider.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("小明"));
    assert!(prompts[0].contains("今天做什么"));
}
