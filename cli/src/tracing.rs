use anyhow::Result;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Installs the global subscriber, with records from the `log` facade
/// forwarded into it.
///
/// Without an explicit level the filter is taken from `RUST_LOG`.
pub fn init(app: String, level: Option<LogLevel>) -> Result<()> {
    LogTracer::init()?;

    let filter = match level {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    ::tracing::subscriber::set_global_default(subscriber)?;

    ::tracing::debug!(app = %app, "logging initialized");
    Ok(())
}
