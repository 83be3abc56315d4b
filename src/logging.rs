//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a stderr `fmt` subscriber filtered by `config.filter`.
///
/// An unparsable directive falls back to `warn` and is reported once the
/// subscriber is up. Calling this twice leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let (filter, rejected) = match EnvFilter::try_new(&config.filter) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("warn"), Some(e.to_string())),
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if let (true, Some(error)) = (installed, rejected) {
        tracing::warn!(filter = %config.filter, error = %error, "invalid log filter; using `warn`");
    }
}
