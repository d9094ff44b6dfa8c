// Logging setup for the deploy CLI
//
// Logs go to stderr so the deployment report on stdout stays readable.

use chatbot_config::{LogConfig, LogFormat};

/// Initialize tracing from the log section of the runtime config
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already installed
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        ),
    };
}
