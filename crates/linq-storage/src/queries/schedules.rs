// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled event CRUD operations.

use linq_core::LinqError;
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{map_tr_err, Database};
use crate::models::{EventId, EventTime, ScheduledEvent};

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledEvent> {
    let raw_time: String = row.get(1)?;
    let event_time = EventTime::parse(&raw_time)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(ScheduledEvent {
        id: row.get(0)?,
        event_time,
        event_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Validate and store a new event. Returns its id.
///
/// Validation happens before the database is touched, so a rejected event
/// leaves the store unchanged.
pub async fn add(db: &Database, event_time: &str, event_name: &str) -> Result<EventId, LinqError> {
    let time = EventTime::parse(event_time)?;
    let name = event_name.trim().to_string();
    if name.is_empty() {
        return Err(LinqError::Validation(
            "event name must not be empty".to_string(),
        ));
    }
    let time = time.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO schedules (event_time, event_name) VALUES (?1, ?2)",
                params![time, name],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Store an event with an externally supplied creation time (used by import).
pub async fn add_with_timestamp(
    db: &Database,
    event_time: EventTime,
    event_name: &str,
    created_at: &str,
) -> Result<EventId, LinqError> {
    let name = event_name.trim().to_string();
    if name.is_empty() {
        return Err(LinqError::Validation(
            "event name must not be empty".to_string(),
        ));
    }
    let time = event_time.to_string();
    let created_at = created_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO schedules (event_time, event_name, created_at) VALUES (?1, ?2, ?3)",
                params![time, name, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// All events, earliest time first; ties keep insertion order.
pub async fn list(db: &Database) -> Result<Vec<ScheduledEvent>, LinqError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_time, event_name, created_at
                 FROM schedules ORDER BY event_time ASC, id ASC",
            )?;
            let events = stmt
                .query_map([], row_to_event)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(events)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one event by id.
pub async fn get(db: &Database, id: EventId) -> Result<Option<ScheduledEvent>, LinqError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, event_time, event_name, created_at FROM schedules WHERE id = ?1",
                params![id],
                row_to_event,
            );
            match result {
                Ok(event) => Ok(Some(event)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Remove an event and return what was removed.
///
/// Lookup and delete run in one transaction. An unknown id yields
/// [`LinqError::NotFound`] and nothing changes.
pub async fn delete(db: &Database, id: EventId) -> Result<ScheduledEvent, LinqError> {
    let removed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing = match tx.query_row(
                "SELECT id, event_time, event_name, created_at FROM schedules WHERE id = ?1",
                params![id],
                row_to_event,
            ) {
                Ok(event) => Some(event),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e),
            };
            if existing.is_some() {
                tx.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
            }
            tx.commit()?;
            Ok(existing)
        })
        .await
        .map_err(map_tr_err)?;

    removed.ok_or(LinqError::NotFound {
        entity: "scheduled event",
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_list_orders_by_time() {
        let db = Database::open_in_memory().await.unwrap();
        add(&db, "21:00", "读书").await.unwrap();
        add(&db, "7:05", "晨跑").await.unwrap();
        add(&db, "12:30", "午饭").await.unwrap();

        let events = list(&db).await.unwrap();
        let times: Vec<String> = events.iter().map(|e| e.event_time.to_string()).collect();
        assert_eq!(times, vec!["07:05", "12:30", "21:00"]);
        assert_eq!(events[0].event_name, "晨跑");
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let db = Database::open_in_memory().await.unwrap();
        let a = add(&db, "09:00", "数学").await.unwrap();
        let b = add(&db, "09:00", "英语").await.unwrap();
        let ids: Vec<EventId> = list(&db).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn invalid_time_is_rejected_without_writing() {
        let db = Database::open_in_memory().await.unwrap();
        let err = add(&db, "25:00", "meeting").await.unwrap_err();
        assert!(matches!(err, LinqError::Validation(_)));
        assert!(list(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let err = add(&db, "10:00", "   ").await.unwrap_err();
        assert!(matches!(err, LinqError::Validation(_)));
        assert!(list(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_returns_stored_event() {
        let db = Database::open_in_memory().await.unwrap();
        let id = add(&db, "18:00", "健身").await.unwrap();
        let event = get(&db, id).await.unwrap().unwrap();
        assert_eq!(event.event_name, "健身");
        assert!(get(&db, id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_removed_event() {
        let db = Database::open_in_memory().await.unwrap();
        let keep = add(&db, "08:00", "早餐").await.unwrap();
        let gone = add(&db, "09:00", "开会").await.unwrap();

        let removed = delete(&db, gone).await.unwrap();
        assert_eq!(removed.id, gone);
        assert_eq!(removed.event_name, "开会");

        let remaining: Vec<EventId> = list(&db).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![keep]);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found_and_changes_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        add(&db, "08:00", "早餐").await.unwrap();

        let err = delete(&db, 7).await.unwrap_err();
        assert!(matches!(err, LinqError::NotFound { id: 7, .. }));
        assert_eq!(list(&db).await.unwrap().len(), 1);
    }
}
