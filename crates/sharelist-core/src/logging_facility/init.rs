//! Subscriber installation

use std::sync::Once;

use serde::Deserialize;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output profile, selected by `log_profile` in the report configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable lines, debug level
    #[default]
    Development,
    /// JSON lines, info level
    Production,
    /// Bare registry; tests install the capture layer instead
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "sharelist_core=debug",
            Profile::Production => "sharelist_core=info",
            Profile::Test => "off",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INSTALLED: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call in a process has an effect.
pub fn init(profile: Profile) {
    INSTALLED.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        // Another subscriber (a test capture, an embedding host) already owns the slot.
        installed.ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        profile: Profile,
    }

    #[test]
    fn test_profile_parses_lowercase_names() {
        let holder: Holder = toml::from_str("profile = \"production\"").unwrap();
        assert_eq!(holder.profile, Profile::Production);
        assert!(toml::from_str::<Holder>("profile = \"Verbose\"").is_err());
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(Profile::default(), Profile::Development);
        assert_eq!(Profile::Development.default_directive(), "sharelist_core=debug");
        assert_eq!(Profile::Production.default_directive(), "sharelist_core=info");
        assert_eq!(Profile::Test.default_directive(), "off");
    }
}
