//! Structured logging for the daemon.
//!
//! Wires up `tracing` / `tracing-subscriber`: one span per client session,
//! selectable output format, and `RUST_LOG`-based filtering that overrides
//! the configured level when set.
//!
//! # Example
//! ```no_run
//! use rust_scope::logging::{self, LogFormat, LogSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! logging::init(&LogSettings::new(tracing::Level::DEBUG, LogFormat::Compact))?;
//! tracing::info!("daemon started");
//! # Ok(())
//! # }
//! ```

use crate::config::ApplicationConfig;
use crate::error::{ScopeError, ScopeResult};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line colored output for interactive use.
    Pretty,
    /// One event per line without colors, for service logs.
    Compact,
    /// JSON for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = ScopeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ScopeError::Configuration(format!(
                "invalid log_format '{name}', must be one of: pretty, compact, json"
            ))),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Fallback level when `RUST_LOG` is unset.
    pub level: Level,
    /// Event output format.
    pub format: LogFormat,
    /// Emit span open/close events (session lifecycle).
    pub span_events: bool,
}

impl LogSettings {
    /// Settings with the given level and format, span events on.
    pub fn new(level: Level, format: LogFormat) -> Self {
        Self {
            level,
            format,
            span_events: true,
        }
    }

    /// Resolve the names from the `[application]` configuration section.
    pub fn from_config(app: &ApplicationConfig) -> ScopeResult<Self> {
        let level = Level::from_str(&app.log_level).map_err(|_| {
            ScopeError::Configuration(format!(
                "invalid log_level '{}', must be one of: trace, debug, info, warn, error",
                app.log_level
            ))
        })?;
        Ok(Self::new(level, app.log_format.parse()?))
    }

    /// Enable or disable span lifecycle events.
    pub fn span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }
}

/// Install the global subscriber.
///
/// Idempotent: a second call (tests racing to install) succeeds without
/// replacing the live subscriber.
pub fn init(settings: &LogSettings) -> ScopeResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let span_events = if settings.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let events = tracing_subscriber::fmt::layer().with_span_events(span_events);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match settings.format {
        LogFormat::Pretty => events.pretty().boxed(),
        LogFormat::Compact => events.compact().with_ansi(false).boxed(),
        LogFormat::Json => events.json().boxed(),
    };

    let installed = Registry::default().with(layer.with_filter(filter)).try_init();
    match installed {
        Ok(()) => Ok(()),
        // another subscriber won the race; keep it
        Err(err) if err.to_string().contains("already been set") => Ok(()),
        Err(err) => Err(ScopeError::Configuration(format!(
            "failed to install tracing subscriber: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("Json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn settings_resolve_from_application_config() {
        let app = ApplicationConfig {
            log_level: "warn".into(),
            log_format: "json".into(),
        };
        let settings = LogSettings::from_config(&app).unwrap();
        assert_eq!(settings.level, Level::WARN);
        assert_eq!(settings.format, LogFormat::Json);
        assert!(settings.span_events);
    }

    #[test]
    fn bad_names_are_configuration_errors() {
        let app = ApplicationConfig {
            log_level: "loud".into(),
            log_format: "pretty".into(),
        };
        assert!(matches!(
            LogSettings::from_config(&app),
            Err(ScopeError::Configuration(_))
        ));

        let app = ApplicationConfig {
            log_level: "info".into(),
            log_format: "xml".into(),
        };
        assert!(matches!(
            LogSettings::from_config(&app),
            Err(ScopeError::Configuration(_))
        ));
    }

    #[test]
    fn init_is_idempotent() {
        let settings = LogSettings::new(Level::ERROR, LogFormat::Compact).span_events(false);
        assert!(init(&settings).is_ok());
        assert!(init(&settings).is_ok());
    }
}
