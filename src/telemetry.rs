use crate::error::{KanbanError, Result};
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber filtered by `filter`.
///
/// A subscriber installed earlier (by the host application or a previous
/// call) is left in place.
pub fn init_tracing(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(filter)
        .map_err(|e| KanbanError::ConfigError(format!("invalid log filter '{}': {}", filter, e)))?;

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
