//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Filtered registry without output; silent unless `RUST_LOG` is set
    Test,
}

impl Profile {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "statetree=debug",
            Profile::Production => "statetree=info",
            Profile::Test => "off",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Sets up the global tracing subscriber for the selected profile. Only the
/// first call has an effect; a subscriber installed elsewhere beforehand is
/// left in place.
///
/// # Example
///
/// ```
/// use statetree_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()))
        };
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter())
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter())
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().with(filter()).try_init(),
        };
        if installed.is_err() {
            tracing::debug!(profile = ?profile, "global subscriber already installed");
        }
    });
}
