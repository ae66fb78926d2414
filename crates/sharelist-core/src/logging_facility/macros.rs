//! Canonical lifecycle logging macros
//!
//! Every lifecycle event carries `component`, `op` and `event`; extra
//! `key = value` fields follow in tracing's field syntax.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::sharelist_core_types::schema::$event
            $(, $($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use sharelist_core::log_op_start;
/// log_op_start!("enumerate_filtered");
/// log_op_start!("enumerate_filtered", user_id = "alice");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use sharelist_core::log_op_end;
/// log_op_end!("serialize", duration_ms = 3);
/// log_op_end!("formatted_shares", duration_ms = 3, record_count = 12usize);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log an operation error
///
/// Accepts anything convertible into [`crate::errors::ExError`]. The error's
/// kind and code are always recorded, its user and path when it carries them.
///
/// ```
/// # use sharelist_core::{log_op_error, errors::ShareListError};
/// let err = ShareListError::NoPreviousReport { path: "/Reports".to_string() };
/// log_op_error!("diff_against_previous", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            user_id = ex_err.user_id(),
            path = ex_err.path()
            $(, $($field)*)?
        )
    }};
}
