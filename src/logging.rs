use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the command-line runner.
///
/// - Stderr: compact, human-readable; stdout is reserved for reports
/// - Default level: INFO for dependencies, DEBUG for this crate; override via RUST_LOG
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,apitest_engine=debug"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .compact();

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();

    tracing::debug!("Tracing initialized");
}
