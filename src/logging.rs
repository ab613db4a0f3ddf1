use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level variable used by the onboarding Lambda functions
pub const ENV_LOGLEVEL: &str = "LOGLEVEL";

/// Install a fmt subscriber for binaries embedding this crate
///
/// The library itself only emits `tracing` events. Level comes from
/// `LOGLEVEL` (`DEBUG`, `INFO`, `WARNING`, ...), then `RUST_LOG`, then `info`.
/// Calling this twice is harmless.
pub fn init() {
    let fmt_layer = fmt::layer().with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init();
}

fn env_filter() -> EnvFilter {
    std::env::var(ENV_LOGLEVEL)
        .ok()
        .and_then(|level| level_directive(&level))
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Map Python-style level names onto tracing directives
fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" | "WARNING" => Some("warn"),
        "ERROR" | "CRITICAL" | "FATAL" => Some("error"),
        _ => None,
    }
}
