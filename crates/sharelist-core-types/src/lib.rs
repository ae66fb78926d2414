//! Core types shared across the share-listing crates
//!
//! - **Schema constants**: canonical structured-logging field keys and event names
//! - **Sensitive data**: `Sensitive<T>` marker so share tokens never reach a log line

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
