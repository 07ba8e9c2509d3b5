//! Tracing/logging initialization.
//!
//! JSON lines on stdout, one object per event, with span fields (tenant,
//! owner_id, nonce, ...) flattened in.

use tracing_subscriber::EnvFilter;

pub fn default_level(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Initialize tracing/logging for the process.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
