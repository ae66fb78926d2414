//! Share listing core
//!
//! Audits the share grants of a collaboration platform:
//! - Lazy enumeration of shares per user and share type
//! - A filter pipeline (path, token, role, expiration, orphan exclusion)
//! - Projection into flat report records and JSON/CSV serialization
//! - Keyed diffs between two JSON reports
//! - Report runs: naming, target checks, recipient validation
//!
//! Storage, file trees and user directories are collaborator traits in
//! [`ports`]; [`memory`] provides in-memory implementations.

pub mod config;
pub mod diff;
pub mod enumerate;
pub mod errors;
pub mod filter;
pub mod format;
pub mod logging_facility;
pub mod memory;
pub mod model;
pub mod ports;
pub mod report;
pub mod serialize;
pub mod service;

pub use sharelist_core_types;

// Re-export commonly used types
pub use config::ReportConfig;
pub use diff::{compute_diff, DiffResult};
pub use enumerate::{ShareEnumerator, ShareStream, UnscopedSource};
pub use errors::{ExError, ExErrorKind, Result, ShareListError};
pub use filter::{ExpirationFilter, FilterCode, FilterOptions, FilteredShares, RoleFilter};
pub use format::ShareFormatter;
pub use model::{FormattedRecord, Permissions, Share, ShareTarget, ShareType};
pub use ports::{FileTree, Page, ShareStore, UserDirectory};
pub use report::{DiffOutcome, Report, ReportArchive, StoredReport, TargetPolicy, TargetStatus};
pub use serialize::ReportFormat;
pub use service::SharesList;
