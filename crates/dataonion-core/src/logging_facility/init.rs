//! Process-wide subscriber installation

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Which subscriber to install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, factory and store at debug
    Development,
    /// JSON lines, lifecycle events only
    Production,
    /// In-memory capture for assertions (see [`super::test_capture`])
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directives(&self) -> &'static str {
        match self {
            Profile::Development => "warn,dataonion_core=debug,dataonion_store=debug",
            Profile::Production => "warn,dataonion_store=info",
            Profile::Test => "debug",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Install the global subscriber for `profile`
///
/// Returns `false` when a global subscriber already exists; the earlier one
/// stays in place, so repeated calls are harmless.
///
/// ```
/// use dataonion_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// assert!(!init(Profile::Production));
/// ```
pub fn init(profile: Profile) -> bool {
    match profile {
        Profile::Development => tracing_subscriber::fmt()
            .with_env_filter(profile.filter())
            .finish()
            .try_init()
            .is_ok(),
        Profile::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(profile.filter())
            .finish()
            .try_init()
            .is_ok(),
        Profile::Test => super::test_capture::install().1,
    }
}
