//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::StoreConfig;

/// Install a `fmt` subscriber filtered by `config.log_filter`.
///
/// Returns false if a global subscriber was already installed, in which
/// case the existing one stays in place.
pub fn init(config: &StoreConfig) -> bool {
    let (filter, invalid) = match EnvFilter::try_new(&config.log_filter) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err)),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if let Some(err) = invalid {
        tracing::warn!(filter = %config.log_filter, "invalid log filter, using info: {err}");
    }
    installed
}
