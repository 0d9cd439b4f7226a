//! Logging bootstrap. Logs go to stderr; stdout carries only `prime N` lines.

use tracing_subscriber::EnvFilter;

/// Parse log level from a CLI string
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "off" | "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::WARN,
    }
}

/// Initialize console logging. `RUST_LOG` overrides `level`.
pub fn init(level: &str) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(parse_log_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
