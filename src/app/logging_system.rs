use super::config::{LogFormat, LogLevel};
use parking_lot::RwLock;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    #[error("Invalid log directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },
    #[error("Logging initialization failed: {0}")]
    InitFailed(String),
}

// Noisy HTTP stack crates
const DEFAULT_DIRECTIVES: &[&str] = &["hyper=warn", "reqwest=warn", "h2=warn", "rustls=warn"];

fn level_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Collects filter directives and installs the global subscriber.
#[derive(Debug, Default)]
pub struct LoggingSystem {
    directives: RwLock<Vec<String>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directive(&self, directive: &str) -> Result<(), LoggingError> {
        directive
            .parse::<Directive>()
            .map_err(|e| LoggingError::InvalidDirective {
                directive: directive.to_string(),
                reason: e.to_string(),
            })?;
        self.directives.write().push(directive.to_string());
        Ok(())
    }

    pub fn add_default_directives(&self) -> Result<(), LoggingError> {
        for directive in DEFAULT_DIRECTIVES {
            self.add_directive(directive)?;
        }
        Ok(())
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    /// Default level first, then the directives in insertion order.
    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();
        let mut parts = Vec::with_capacity(directives.len() + 1);
        parts.push(level_str(default_level).to_string());
        parts.extend(directives.iter().cloned());
        parts.join(",")
    }

    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        format: LogFormat,
    ) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);
        let env_filter = EnvFilter::try_new(&filter_string)
            .map_err(|e| LoggingError::InitFailed(format!("filter '{filter_string}': {e}")))?;

        // Diagnostics go to stderr; stdout may carry piped data
        let result = match format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(false),
                )
                .try_init(),
        };

        result.map_err(|e| LoggingError::InitFailed(e.to_string()))
    }
}

/// Installs the global subscriber once; later calls return the first outcome.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    static INIT: OnceLock<Result<(), LoggingError>> = OnceLock::new();

    INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives()?;
        logging_system.initialize_tracing(level, format)
    })
    .clone()
}
