//! Tracing subscriber setup

use crate::utils::configuration::LoggingConfig;
use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to the
/// configured level. Does nothing if a global subscriber already exists.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.show_targets)
        .try_init();
    if let Err(e) = installed {
        // another thread won the race
        if tracing::dispatcher::has_been_set() {
            return Ok(());
        }
        return Err(anyhow!("Failed to initialize logging: {}", e));
    }

    info!("📝 Logging initialized at level '{}'", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        let config = LoggingConfig::default();
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
    }
}
