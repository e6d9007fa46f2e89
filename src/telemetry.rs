//! Tracing subscriber setup shared by every binary.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_level("info")
}

/// Install the global subscriber with `level` as the fallback filter.
pub fn init_tracing_with_level(level: &str) -> Result<(), SetGlobalDefaultError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
