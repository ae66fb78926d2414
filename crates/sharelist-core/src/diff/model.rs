//! Report diff output types.
//!
//! Field changes are kept in a `BTreeMap` so the serialized diff is stable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keyed comparison of two shares reports.
///
/// `added` follows the order of the new report; `removed` and `modified`
/// follow the order of the previous one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiffResult {
    /// Record ids present only in the new report
    pub added: Vec<String>,
    /// Record ids present only in the previous report
    pub removed: Vec<String>,
    /// Records present in both reports whose fields differ
    pub modified: Vec<RecordChange>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn modified_ids(&self) -> Vec<&str> {
        self.modified.iter().map(|m| m.id.as_str()).collect()
    }
}

/// Field-level changes of one record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordChange {
    pub id: String,
    /// Changed fields keyed by field name
    pub changes: BTreeMap<String, FieldChange>,
}

/// Old and new value of a changed field; `None` means the field was absent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub old: Option<Value>,
    pub new: Option<Value>,
}
