use anyhow::{Result, anyhow};
use core_types::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Env var holding an `EnvFilter` directive; wins over the config level.
pub const LOG_ENV: &str = "VECTORBASE_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for results.
pub fn init_tracing_with_config(cfg: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&cfg.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match cfg.format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn env_filter(fallback: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback)
            .map_err(|e| anyhow!("invalid log level '{fallback}': {e}")),
    }
}
