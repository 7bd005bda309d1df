// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn operations. Turns are append-only.

use linq_core::LinqError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{ConversationTurn, TurnId};

const TURN_COLUMNS: &str = "id, user_input, ai_output, created_at";

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationTurn> {
    Ok(ConversationTurn {
        id: row.get(0)?,
        user_input: row.get(1)?,
        ai_output: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Append a turn with a storage-assigned timestamp. Returns the new id.
pub async fn append(db: &Database, user_input: &str, ai_output: &str) -> Result<TurnId, LinqError> {
    let user_input = user_input.to_string();
    let ai_output = ai_output.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO turns (user_input, ai_output) VALUES (?1, ?2)",
                params![user_input, ai_output],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Append a turn keeping an externally supplied timestamp (used by import).
pub async fn append_with_timestamp(
    db: &Database,
    user_input: &str,
    ai_output: &str,
    created_at: &str,
) -> Result<TurnId, LinqError> {
    let user_input = user_input.to_string();
    let ai_output = ai_output.to_string();
    let created_at = created_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO turns (user_input, ai_output, created_at) VALUES (?1, ?2, ?3)",
                params![user_input, ai_output, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Every turn in ascending id order.
///
/// A single SELECT, so the result is a consistent snapshot: appends that
/// land while it runs may be missing but nothing is duplicated or skipped.
pub async fn all_turns(db: &Database) -> Result<Vec<ConversationTurn>, LinqError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TURN_COLUMNS} FROM turns ORDER BY id ASC"))?;
            let turns = stmt
                .query_map([], row_to_turn)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(turns)
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent turns, oldest first.
pub async fn recent_turns(db: &Database, limit: usize) -> Result<Vec<ConversationTurn>, LinqError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TURN_COLUMNS} FROM turns ORDER BY id DESC LIMIT ?1"
            ))?;
            let mut turns = stmt
                .query_map(params![limit], row_to_turn)?
                .collect::<Result<Vec<_>, _>>()?;
            turns.reverse();
            Ok(turns)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of stored turns.
pub async fn count(db: &Database) -> Result<u64, LinqError> {
    db.connection()
        .call(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM turns", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_increasing_ids_and_timestamp() {
        let db = Database::open_in_memory().await.unwrap();

        let first = append(&db, "你好", "你好！").await.unwrap();
        let second = append(&db, "我喜欢篮球", "篮球很棒").await.unwrap();
        assert!(second > first);

        let turns = all_turns(&db).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].id, first);
        assert_eq!(turns[0].user_input, "你好");
        assert_eq!(turns[1].ai_output, "篮球很棒");
        assert!(turns[0].created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn all_turns_empty_store() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(all_turns(&db).await.unwrap().is_empty());
        assert_eq!(count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recent_turns_returns_latest_in_chronological_order() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..6 {
            append(&db, &format!("q{i}"), &format!("a{i}")).await.unwrap();
        }

        let recent = recent_turns(&db, 4).await.unwrap();
        let inputs: Vec<&str> = recent.iter().map(|t| t.user_input.as_str()).collect();
        assert_eq!(inputs, vec!["q2", "q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn recent_turns_with_fewer_rows_than_limit() {
        let db = Database::open_in_memory().await.unwrap();
        append(&db, "only", "one").await.unwrap();
        let recent = recent_turns(&db, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent_turns(&db, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_with_timestamp_keeps_supplied_time() {
        let db = Database::open_in_memory().await.unwrap();
        append_with_timestamp(&db, "旧对话", "旧回复", "2025-01-02 03:04:05")
            .await
            .unwrap();
        let turns = all_turns(&db).await.unwrap();
        assert_eq!(turns[0].created_at, "2025-01-02 03:04:05");
        assert_eq!(count(&db).await.unwrap(), 1);
    }
}
