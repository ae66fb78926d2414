//! Redacting wrapper for share tokens
//!
//! Link and email shares carry a public token that grants access to the
//! shared node. Wrapped in [`Sensitive`], the token renders as a fixed marker
//! in `Debug`, `Display` and any serialized payload, so a share can be logged
//! whole. Reports read the clear value through [`Sensitive::expose`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Text every redacted value renders as
pub const REDACTED: &str = "***REDACTED***";

/// A value that never formats or serializes in clear
///
/// ```
/// use sharelist_core_types::Sensitive;
///
/// let token = Sensitive::new("AbCdEf123".to_string());
/// assert_eq!(format!("{token:?}"), "***REDACTED***");
/// assert!(token.matches("AbCdEf123"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: AsRef<str>> Sensitive<T> {
    /// Compare against a clear candidate without exposing the value
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_ref() == candidate
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}
