//! Structured logging setup.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! takes precedence over the `-v` count when set.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "qualforge=warn",
        1 => "qualforge=info",
        2 => "qualforge=debug",
        _ => "qualforge=trace",
    }
}

fn env_filter(verbosity: u8) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid RUST_LOG directives '{}'", directives)),
        _ => EnvFilter::try_new(default_directive(verbosity))
            .context("failed to build default log filter"),
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init(verbosity: u8, format: LogFormat) -> Result<()> {
    let filter = env_filter(verbosity)?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()
            .context("failed to install JSON log subscriber")?,
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .context("failed to install log subscriber")?,
    }

    tracing::debug!(verbosity, format = ?format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "qualforge=warn");
        assert_eq!(default_directive(1), "qualforge=info");
        assert_eq!(default_directive(2), "qualforge=debug");
        assert_eq!(default_directive(9), "qualforge=trace");
    }

    #[test]
    #[serial]
    fn rust_log_overrides_verbosity() {
        unsafe { std::env::set_var("RUST_LOG", "qualforge=debug,reqwest=warn") };
        let filter = env_filter(0).unwrap();
        unsafe { std::env::remove_var("RUST_LOG") };

        assert!(filter.to_string().contains("qualforge=debug"));
    }

    #[test]
    #[serial]
    fn invalid_rust_log_is_an_error() {
        unsafe { std::env::set_var("RUST_LOG", "qualforge=[") };
        let result = env_filter(0);
        unsafe { std::env::remove_var("RUST_LOG") };

        assert!(result.is_err());
    }
}
