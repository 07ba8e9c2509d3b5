//! Process-wide tracing setup shared by the server and the setup tool.

/// Initialize process-wide observability.
///
/// `debug` lowers the default level to `debug`; `RUST_LOG` still wins when set.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(debug: bool) {
    tracing::init(tracing::default_level(debug));
}

/// Tracing configuration (filters, layers).
pub mod tracing;
