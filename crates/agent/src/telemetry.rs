//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::AgentConfig;

/// Install the global fmt subscriber at `level`. `RUST_LOG` takes precedence.
///
/// Returns false when a subscriber is already installed.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Install the subscriber at the configured `loglevel`.
pub fn init_from_config(config: &AgentConfig) -> bool {
    init_tracing(&config.loglevel)
}
