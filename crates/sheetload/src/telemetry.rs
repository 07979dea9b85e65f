//! Logging setup.
//!
//! Events from both `tracing` and `log` macros end up in a single
//! `tracing-subscriber` registry. `RUST_LOG` controls filtering.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::LogFormat;
use crate::error::SheetloadError;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(format: LogFormat) -> Result<(), SheetloadError> {
    tracing_log::LogTracer::init().map_err(|e| SheetloadError::Telemetry(e.to_string()))?;

    let registry = Registry::default().with(env_filter());
    let result = match format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
        }
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_current_span(false)),
        ),
    };
    result.map_err(|e| SheetloadError::Telemetry(e.to_string()))
}
