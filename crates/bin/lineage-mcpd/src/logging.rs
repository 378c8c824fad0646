use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogLevel};

type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Installs the global subscriber. Output goes to stderr; stdout belongs to
/// the stdio transport. `RUST_LOG` takes precedence over `level`.
pub fn init(level: LogLevel, format: LogFormat) -> Result<(), InitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter);
    match format {
        LogFormat::Text => builder.with_ansi(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    }
}
