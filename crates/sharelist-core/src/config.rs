//! Report configuration loaded from TOML
//!
//! Every field is optional; an empty file yields [`ReportConfig::default`].
//!
//! ```toml
//! default_format = "csv"
//! formats = ["json", "csv"]
//! unscoped_source = "all-shares"
//! target_policy = "warn"
//! log_profile = "production"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::enumerate::UnscopedSource;
use crate::errors::{ExError, ExErrorKind, Result};
use crate::logging_facility::Profile;
use crate::report::TargetPolicy;
use crate::serialize::ReportFormat;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Format used when a caller asks for one serialization
    pub default_format: ReportFormat,
    /// Formats written per report run, in order
    pub formats: Vec<ReportFormat>,
    pub unscoped_source: UnscopedSource,
    pub target_policy: TargetPolicy,
    pub log_profile: Profile,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_format: ReportFormat::Json,
            formats: vec![ReportFormat::Json, ReportFormat::Csv],
            unscoped_source: UnscopedSource::default(),
            target_policy: TargetPolicy::default(),
            log_profile: Profile::default(),
        }
    }
}

impl ReportConfig {
    /// Parse configuration text
    ///
    /// # Errors
    ///
    /// `InvalidInput` on malformed TOML, unknown keys or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("parse_config")
                .with_message(format!("invalid report configuration: {}", e))
        })
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `InvalidInput` if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading report configuration");
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_path(path.display().to_string())
                .with_message(format!("read config: {}", e))
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_path(path.display().to_string()))
    }

    /// Install the global subscriber for the configured `log_profile`
    pub fn init_logging(&self) {
        crate::logging_facility::init(self.log_profile);
    }
}
