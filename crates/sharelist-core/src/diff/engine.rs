//! Report diff computation engine.
//!
//! The core entry point is [`compute_diff`], which accepts the raw bytes of
//! two JSON shares reports and produces a [`DiffResult`].

use crate::diff::model::{DiffResult, FieldChange, RecordChange};
use crate::errors::{ExError, ExErrorKind, Result, ShareListError};
use crate::model::FormattedRecord;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Field every report record is keyed by
pub const ID_FIELD: &str = "id";

/// Records of one report keyed by id, remembering first-seen order
#[derive(Debug, Default)]
struct KeyedRecords {
    order: Vec<String>,
    records: HashMap<String, Map<String, Value>>,
}

impl KeyedRecords {
    /// Later records with an already seen id replace the earlier one
    fn insert(&mut self, id: String, record: Map<String, Value>) {
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }
}

/// Parse raw report bytes into a JSON array.
///
/// # Errors
///
/// - `InvalidReport`: bytes are not UTF-8, not JSON, or the root is not an array
fn parse_report_bytes(bytes: &[u8], side: &str) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ExError::new(ExErrorKind::InvalidReport)
            .with_op("parse_report_bytes")
            .with_message(format!("{} report is not valid UTF-8: {}", side, e))
    })?;

    let raw: Value = serde_json::from_str(text).map_err(|e| {
        ExError::new(ExErrorKind::InvalidReport)
            .with_op("parse_report_bytes")
            .with_message(format!("{} report is not valid JSON: {}", side, e))
    })?;

    Ok(raw)
}

fn key_records(report: &Value, side: &str) -> Result<KeyedRecords> {
    let items = report.as_array().ok_or_else(|| {
        ExError::new(ExErrorKind::InvalidReport)
            .with_op("key_records")
            .with_message(format!("{} report root must be an array", side))
    })?;

    let mut keyed = KeyedRecords::default();
    for (index, item) in items.iter().enumerate() {
        let record = item.as_object().ok_or_else(|| {
            ExError::from(ShareListError::InvalidReport {
                reason: format!("{} report entry {} is not an object", side, index),
            })
        })?;
        let id = match record.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ShareListError::MissingField {
                    index,
                    field: ID_FIELD.to_string(),
                }
                .into())
            }
        };
        keyed.insert(id, record.clone());
    }
    Ok(keyed)
}

/// Canonical form for comparison: arrays become sorted, de-duplicated sets
/// and object keys are sorted, recursively.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let set: BTreeSet<String> = items
                .iter()
                .map(|item| normalize(item).to_string())
                .collect();
            Value::Array(
                set.into_iter()
                    .map(|encoded| serde_json::from_str(&encoded).unwrap_or(Value::String(encoded)))
                    .collect(),
            )
        }
        Value::Object(fields) => {
            let sorted: BTreeMap<&String, Value> =
                fields.iter().map(|(k, v)| (k, normalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        scalar => scalar.clone(),
    }
}

fn field_changes(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
) -> BTreeMap<String, FieldChange> {
    let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    fields
        .into_iter()
        .filter_map(|field| {
            let before = old.get(field);
            let after = new.get(field);
            let same = match (before, after) {
                (Some(a), Some(b)) => normalize(a) == normalize(b),
                (None, None) => true,
                _ => false,
            };
            (!same).then(|| {
                (
                    field.clone(),
                    FieldChange {
                        old: before.cloned(),
                        new: after.cloned(),
                    },
                )
            })
        })
        .collect()
}

/// Diff two decoded reports.
///
/// # Errors
///
/// - `InvalidReport`: a root is not an array or an entry is not an object
/// - `MissingField`: an entry has no string or numeric `id`
pub fn diff_values(previous: &Value, new: &Value) -> Result<DiffResult> {
    let previous = key_records(previous, "previous")?;
    let new = key_records(new, "new")?;

    let added: Vec<String> = new
        .order
        .iter()
        .filter(|id| !previous.contains(id))
        .cloned()
        .collect();
    let removed: Vec<String> = previous
        .order
        .iter()
        .filter(|id| !new.contains(id))
        .cloned()
        .collect();

    let mut modified: Vec<RecordChange> = Vec::new();
    for id in &previous.order {
        let (Some(old), Some(current)) = (previous.records.get(id), new.records.get(id)) else {
            continue;
        };
        let changes = field_changes(old, current);
        if !changes.is_empty() {
            modified.push(RecordChange {
                id: id.clone(),
                changes,
            });
        }
    }

    tracing::debug!(
        added_count = added.len(),
        removed_count = removed.len(),
        modified_count = modified.len(),
        "reports compared"
    );

    Ok(DiffResult {
        added,
        removed,
        modified,
    })
}

/// Compute a keyed diff between two serialized JSON reports.
///
/// # Errors
///
/// - `InvalidReport`: either report fails UTF-8/JSON/shape validation
/// - `MissingField`: a record lacks its `id`
pub fn compute_diff(previous_bytes: &[u8], new_bytes: &[u8]) -> Result<DiffResult> {
    let previous = parse_report_bytes(previous_bytes, "previous")?;
    let new = parse_report_bytes(new_bytes, "new")?;
    diff_values(&previous, &new)
}

/// Diff two in-memory record sets
pub fn diff_records(previous: &[FormattedRecord], new: &[FormattedRecord]) -> Result<DiffResult> {
    let previous = serde_json::to_value(previous)?;
    let new = serde_json::to_value(new)?;
    diff_values(&previous, &new)
}
