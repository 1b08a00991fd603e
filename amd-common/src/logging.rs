//! Tracing subscriber initialisation

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directives used when `RUST_LOG` is not set
pub fn default_directives(logging: &LoggingConfig) -> String {
    let level = logging.level.to_ascii_lowercase();
    format!(
        "amd_service={0},amd_common={0},tower_http={0}",
        level
    )
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(logging)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_use_configured_level() {
        let logging = LoggingConfig {
            level: "DEBUG".to_string(),
        };
        assert_eq!(
            default_directives(&logging),
            "amd_service=debug,amd_common=debug,tower_http=debug"
        );
    }
}
