//! Field keys and event names of the lifecycle log
//!
//! Every exposed operation emits `start`, then `end` or `end_error`. The
//! `log_op_*` macros write these keys as literal tracing field names; the
//! constants let consumers and tests read them back without typos.

/// Lifecycle event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

/// Keys present on every lifecycle event, next to `component`
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

/// Timing, on `end` and `end_error`
pub const FIELD_DURATION_MS: &str = "duration_ms";

/// Error classification, on `end_error`
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Context
pub const FIELD_USER_ID: &str = "user_id";
pub const FIELD_PATH: &str = "path";

// Counts
pub const FIELD_RECORD_COUNT: &str = "record_count";
pub const FIELD_ADDED_COUNT: &str = "added_count";
pub const FIELD_REMOVED_COUNT: &str = "removed_count";
pub const FIELD_MODIFIED_COUNT: &str = "modified_count";

/// Event names in emission order
pub const LIFECYCLE_EVENTS: [&str; 3] = [EVENT_START, EVENT_END, EVENT_END_ERROR];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        for (i, a) in LIFECYCLE_EVENTS.iter().enumerate() {
            for b in &LIFECYCLE_EVENTS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_context_keys_do_not_shadow_lifecycle_keys() {
        let lifecycle = [FIELD_OP, FIELD_EVENT, FIELD_DURATION_MS];
        for key in [FIELD_USER_ID, FIELD_PATH, FIELD_ERR_KIND, FIELD_ERR_CODE] {
            assert!(!lifecycle.contains(&key), "{key} shadows a lifecycle key");
        }
    }
}
