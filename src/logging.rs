//! Logging setup
//!
//! Structured logging via `tracing`. Level and format come from the config
//! file unless overridden by `SCRIBE_LOG` / `SCRIBE_LOG_FORMAT`. Output goes
//! to stderr so `scribe generate` can keep stdout for the generated text.

use anyhow::{bail, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Filter override, e.g. `SCRIBE_LOG=scribe=debug`
pub const LOG_ENV: &str = "SCRIBE_LOG";
/// Format override: `json` or `text`
pub const LOG_FORMAT_ENV: &str = "SCRIBE_LOG_FORMAT";

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;
    let json = use_json(config)?;

    let base_subscriber = Registry::default().with(filter);

    if json {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}

/// Filter from `SCRIBE_LOG`, else the configured level
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let level = config.level.trim();
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        bail!("Invalid log level '{}'", level);
    }

    Ok(EnvFilter::new(level))
}

fn use_json(config: &LoggingConfig) -> Result<bool> {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(format) => match format.as_str() {
            "json" => Ok(true),
            "text" => Ok(false),
            other => bail!("Invalid {} '{}': expected json or text", LOG_FORMAT_ENV, other),
        },
        Err(_) => Ok(config.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            json: false,
        };
        if std::env::var(LOG_ENV).is_err() {
            assert!(build_env_filter(&config).is_err());
        }
    }

    #[test]
    fn test_accepts_off() {
        let config = LoggingConfig {
            level: "off".to_string(),
            json: false,
        };
        assert!(build_env_filter(&config).is_ok());
    }
}
