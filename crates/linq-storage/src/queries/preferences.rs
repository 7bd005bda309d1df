// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preference fact operations.
//!
//! Uniqueness of `(key_text, value_text)` is owned by the schema. Inserts
//! use `INSERT OR IGNORE` and read the changed-row count, so two racing
//! inserts of the same pair can never both report `Inserted`.

use linq_core::LinqError;
use rusqlite::params;
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::models::{InsertOutcome, NewPreference, PreferenceFact};

/// Insert a fact unless its `(key, value)` pair is already stored.
pub async fn insert_if_absent(
    db: &Database,
    pref: &NewPreference,
) -> Result<InsertOutcome, LinqError> {
    let pref = pref.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO preferences (category, key_text, value_text, source_turn_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![pref.category, pref.key, pref.value, pref.source_turn_id],
            )?;
            Ok(if changed == 1 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::DuplicateIgnored
            })
        })
        .await
        .map_err(map_tr_err)?;
    debug!(?outcome, "preference insert");
    Ok(outcome)
}

/// Every fact in insertion order.
pub async fn all_facts(db: &Database) -> Result<Vec<PreferenceFact>, LinqError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, category, key_text, value_text, source_turn_id
                 FROM preferences ORDER BY id ASC",
            )?;
            let facts = stmt
                .query_map([], |row| {
                    Ok(PreferenceFact {
                        id: row.get(0)?,
                        category: row.get(1)?,
                        key: row.get(2)?,
                        value: row.get(3)?,
                        source_turn_id: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(facts)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of stored facts.
pub async fn count(db: &Database) -> Result<u64, LinqError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}
