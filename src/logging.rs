//! # Logging
//!
//! Structured logging via `tracing`. The level filter comes from `RUST_LOG`
//! and defaults to info for dependencies and debug for this crate; the
//! output format comes from `LOG_FORMAT`.

use crate::config::LogFormat;
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,storefront=debug";

/// Install the global subscriber.
///
/// Call once, early during startup, before anything logs. A second call
/// leaves the first subscriber in place.
pub fn init(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let _ = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Default => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };
}
