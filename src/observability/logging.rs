//! # Logging
//!
//! Global `tracing` subscriber setup.
//!
//! The filter comes from `RUST_LOG` and falls back to
//! `gsm_secret_controller=info`. `LOG_FORMAT=json` switches to structured JSON
//! lines for log aggregation; anything else keeps the human-readable format.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "gsm_secret_controller=info";

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber was already installed.
pub fn init_tracing(log_format: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if log_format.eq_ignore_ascii_case("json") {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}
