use tracing_subscriber::EnvFilter;

use crate::application::PostProcessor;
use crate::domain::error::Result;
use crate::infrastructure::config::ConfigService;

/// Install a `fmt` subscriber for hosts that have none.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns false if a
/// global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Load layered configuration, install logging with its `log_filter`, and
/// build a processor from it
pub fn bootstrap(service: &ConfigService) -> Result<PostProcessor> {
    let config = service.load()?;

    if init_tracing(&config.log_filter) {
        tracing::debug!(filter = %config.log_filter, "Installed tracing subscriber");
    }

    PostProcessor::new(config)
}
