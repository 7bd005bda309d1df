// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON import and export for the three stores.
//!
//! A record is either an object (`Structured`) or an array (`Positional`).
//! Object field names are matched case-insensitively, so `AI_output` and
//! `ai_output` are the same field. Exports always use the structured form.
//!
//! Positional layouts:
//! - conversation: `[user_input, ai_output, timestamp?]`
//! - preference: `[category, key, value, source_id?]`
//! - schedule: `[event_time, event_name, created_time?]`

use std::path::Path;

use linq_core::{EventTime, LinqError, NewPreference, StoreKind, TurnId};
use linq_storage::Storage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// One import record before it is interpreted for a particular store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    Structured(Map<String, Value>),
    Positional(Vec<Value>),
}

impl RawRecord {
    /// First present field among `names`, compared case-insensitively.
    fn field(&self, names: &[&str]) -> Option<&Value> {
        match self {
            RawRecord::Structured(map) => map.iter().find_map(|(k, v)| {
                names
                    .iter()
                    .any(|n| k.eq_ignore_ascii_case(n))
                    .then_some(v)
            }),
            RawRecord::Positional(_) => None,
        }
    }

    fn position(&self, index: usize) -> Option<&Value> {
        match self {
            RawRecord::Positional(items) => items.get(index),
            RawRecord::Structured(_) => None,
        }
    }

    fn get(&self, names: &[&str], index: usize) -> Option<&Value> {
        self.field(names)
            .or_else(|| self.position(index))
            .filter(|v| !v.is_null())
    }

    /// Any string, empty included. Positional numbers and booleans are
    /// taken as their text form.
    fn text(&self, names: &[&str], index: usize) -> Result<String, LinqError> {
        let positional = matches!(self, RawRecord::Positional(_));
        match self.get(names, index) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) if positional => Ok(v.to_string()),
            Some(other) => Err(invalid(format!(
                "`{}` must be a string, found {other}",
                names[0]
            ))),
            None => Err(invalid(format!("missing `{}`", names[0]))),
        }
    }

    /// Like [`RawRecord::text`], but blank strings are rejected.
    fn required_text(&self, names: &[&str], index: usize) -> Result<String, LinqError> {
        let text = self.text(names, index)?;
        if text.trim().is_empty() {
            return Err(invalid(format!("`{}` is empty", names[0])));
        }
        Ok(text)
    }

    fn optional_text(&self, names: &[&str], index: usize) -> Result<Option<String>, LinqError> {
        match self.get(names, index) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(format!(
                "`{}` must be a string, found {other}",
                names[0]
            ))),
        }
    }

    fn optional_id(&self, names: &[&str], index: usize) -> Result<Option<TurnId>, LinqError> {
        match self.get(names, index) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(format!("`{}` must be an integer", names[0]))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(format!("`{}` must be an integer, found `{s}`", names[0]))),
            Some(other) => Err(invalid(format!(
                "`{}` must be an integer, found {other}",
                names[0]
            ))),
        }
    }
}

fn invalid(message: String) -> LinqError {
    LinqError::Validation(message)
}

const USER_INPUT: &[&str] = &["user_input"];
const AI_OUTPUT: &[&str] = &["ai_output"];
const TURN_TIME: &[&str] = &["timestamp", "created_at"];
const CATEGORY: &[&str] = &["category"];
const KEY: &[&str] = &["key_text", "key"];
const VALUE: &[&str] = &["value_text", "value"];
const SOURCE: &[&str] = &["source_id", "source_turn_id"];
const EVENT_TIME: &[&str] = &["event_time"];
const EVENT_NAME: &[&str] = &["event_name"];
const EVENT_CREATED: &[&str] = &["created_time", "created_at"];

/// A conversation turn read from an import record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTurn {
    pub user_input: String,
    pub ai_output: String,
    pub timestamp: Option<String>,
}

/// A scheduled event read from an import record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEvent {
    pub event_time: EventTime,
    pub event_name: String,
    pub created_time: Option<String>,
}

impl TryFrom<&RawRecord> for ImportedTurn {
    type Error = LinqError;

    fn try_from(raw: &RawRecord) -> Result<Self, LinqError> {
        Ok(Self {
            user_input: raw.text(USER_INPUT, 0)?,
            ai_output: raw.text(AI_OUTPUT, 1)?,
            timestamp: raw.optional_text(TURN_TIME, 2)?,
        })
    }
}

impl TryFrom<&RawRecord> for NewPreference {
    type Error = LinqError;

    fn try_from(raw: &RawRecord) -> Result<Self, LinqError> {
        Ok(Self {
            category: raw.required_text(CATEGORY, 0)?,
            key: raw.required_text(KEY, 1)?,
            value: raw.required_text(VALUE, 2)?,
            source_turn_id: raw.optional_id(SOURCE, 3)?,
        })
    }
}

impl TryFrom<&RawRecord> for ImportedEvent {
    type Error = LinqError;

    fn try_from(raw: &RawRecord) -> Result<Self, LinqError> {
        let time = raw.required_text(EVENT_TIME, 0)?;
        Ok(Self {
            event_time: EventTime::parse(&time)?,
            event_name: raw.required_text(EVENT_NAME, 1)?.trim().to_string(),
            created_time: raw.optional_text(EVENT_CREATED, 2)?,
        })
    }
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Preference records whose `(key, value)` pair was already stored.
    pub duplicates: usize,
    /// `(record index, reason)` for every record that was skipped.
    pub rejected: Vec<(usize, String)>,
}

/// Parse a JSON document holding an array of records.
pub fn parse_records(text: &str) -> Result<Vec<Value>, LinqError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| invalid(format!("import file is not valid JSON: {e}")))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(invalid("import file must contain a JSON array".to_string())),
    }
}

/// Import `records` into the store named by `kind`.
///
/// Malformed records are listed in the report and skipped. A storage
/// failure stops the import and is returned.
pub async fn import_records(
    storage: &Storage,
    kind: StoreKind,
    records: Vec<Value>,
) -> Result<ImportReport, LinqError> {
    let mut report = ImportReport::default();
    for (index, value) in records.into_iter().enumerate() {
        let outcome = match serde_json::from_value::<RawRecord>(value) {
            Ok(raw) => import_one(storage, kind, &raw).await,
            Err(_) => Err(invalid("record must be an object or an array".to_string())),
        };
        match outcome {
            Ok(true) => report.imported += 1,
            Ok(false) => report.duplicates += 1,
            Err(e) if e.is_recoverable() => {
                warn!(store = %kind, index, error = %e, "rejected import record");
                report.rejected.push((index, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        store = %kind,
        imported = report.imported,
        duplicates = report.duplicates,
        rejected = report.rejected.len(),
        "import finished"
    );
    Ok(report)
}

/// `Ok(false)` means a duplicate preference.
async fn import_one(storage: &Storage, kind: StoreKind, raw: &RawRecord) -> Result<bool, LinqError> {
    match kind {
        StoreKind::Conversation => {
            let turn = ImportedTurn::try_from(raw)?;
            match &turn.timestamp {
                Some(ts) => {
                    storage
                        .memory
                        .append_with_timestamp(&turn.user_input, &turn.ai_output, ts)
                        .await?
                }
                None => storage.memory.append(&turn.user_input, &turn.ai_output).await?,
            };
            Ok(true)
        }
        StoreKind::Preference => {
            let pref = NewPreference::try_from(raw)?;
            let outcome = storage.preferences.insert_if_absent(&pref).await?;
            Ok(outcome.is_inserted())
        }
        StoreKind::Schedule => {
            let event = ImportedEvent::try_from(raw)?;
            match &event.created_time {
                Some(ts) => {
                    storage
                        .schedules
                        .add_with_timestamp(event.event_time, &event.event_name, ts)
                        .await?
                }
                None => {
                    storage
                        .schedules
                        .add(&event.event_time.to_string(), &event.event_name)
                        .await?
                }
            };
            Ok(true)
        }
    }
}

/// Read and import a JSON file.
pub async fn import_file(
    storage: &Storage,
    kind: StoreKind,
    path: &Path,
) -> Result<ImportReport, LinqError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| invalid(format!("cannot read {}: {e}", path.display())))?;
    let records = parse_records(&text)?;
    debug!(path = %path.display(), records = records.len(), "importing");
    import_records(storage, kind, records).await
}

#[derive(Debug, Serialize)]
struct TurnRecord {
    user_input: String,
    ai_output: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct PreferenceRecord {
    category: String,
    key_text: String,
    value_text: String,
    #[serde(rename = "source_ID")]
    source_id: Option<TurnId>,
}

#[derive(Debug, Serialize)]
struct ScheduleRecord {
    event_time: String,
    event_name: String,
    created_time: String,
}

/// Every row of the store named by `kind`, as an array of structured records.
pub async fn export_records(storage: &Storage, kind: StoreKind) -> Result<Value, LinqError> {
    let value = match kind {
        StoreKind::Conversation => {
            let rows: Vec<TurnRecord> = storage
                .memory
                .all_turns()
                .await?
                .into_iter()
                .map(|t| TurnRecord {
                    user_input: t.user_input,
                    ai_output: t.ai_output,
                    timestamp: t.created_at,
                })
                .collect();
            serde_json::to_value(rows)
        }
        StoreKind::Preference => {
            let rows: Vec<PreferenceRecord> = storage
                .preferences
                .all_facts()
                .await?
                .into_iter()
                .map(|f| PreferenceRecord {
                    category: f.category,
                    key_text: f.key,
                    value_text: f.value,
                    source_id: f.source_turn_id,
                })
                .collect();
            serde_json::to_value(rows)
        }
        StoreKind::Schedule => {
            let rows: Vec<ScheduleRecord> = storage
                .schedules
                .list()
                .await?
                .into_iter()
                .map(|e| ScheduleRecord {
                    event_time: e.event_time.to_string(),
                    event_name: e.event_name,
                    created_time: e.created_at,
                })
                .collect();
            serde_json::to_value(rows)
        }
    };
    value.map_err(|e| LinqError::Internal(format!("cannot encode export: {e}")))
}

/// Pretty JSON export of the store named by `kind`.
pub async fn export_json(storage: &Storage, kind: StoreKind) -> Result<String, LinqError> {
    let value = export_records(storage, kind).await?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| LinqError::Internal(format!("cannot encode export: {e}")))
}

/// Write the export to `path`.
pub async fn export_file(storage: &Storage, kind: StoreKind, path: &Path) -> Result<usize, LinqError> {
    let value = export_records(storage, kind).await?;
    let count = value.as_array().map_or(0, Vec::len);
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| LinqError::Internal(format!("cannot encode export: {e}")))?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| LinqError::storage(format!("cannot write {}", path.display()), e))?;
    info!(store = %kind, path = %path.display(), records = count, "export written");
    Ok(count)
}
