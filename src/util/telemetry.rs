//! Telemetry helpers for structured logging.

/// Install a default tracing subscriber if none is set.
///
/// Filtering follows `RUST_LOG`, falling back to `info`. Users who install
/// their own subscriber before calling this keep it.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
