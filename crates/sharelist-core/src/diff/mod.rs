//! Shares report diff engine.
//!
//! Compares two JSON shares reports record by record, keyed by `id`.
//!
//! ## Entry point
//!
//! ```ignore
//! use sharelist_core::diff::compute_diff;
//!
//! let diff = compute_diff(previous_bytes, new_bytes)?;
//! println!("{} added, {} removed", diff.added.len(), diff.removed.len());
//! ```
//!
//! ## Guarantees
//!
//! - **Reflexive**: diffing a report against itself is empty.
//! - **Order-insensitive arrays**: array-valued fields compare as sets.
//! - **Read-only**: inputs are never modified.

pub mod engine;
pub mod model;

pub use engine::{compute_diff, diff_records, diff_values};
pub use model::{DiffResult, FieldChange, RecordChange};
