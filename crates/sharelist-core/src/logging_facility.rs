//! Structured logging facility
//!
//! - Single initialization point via `init(profile)` or `ReportConfig::init_logging`
//! - Lifecycle macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The service facade owns lifecycle logging for every exposed operation.
//! Enumeration, filtering, formatting and diffing log only at `debug`
//! (per-item exclusions) or `warn` (recoverable report-target problems).
//!
//! ```rust
//! use sharelist_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, OpLifecycle, TestCapture};
