//! Log setup driven by the standard flags.
//!
//! `--log` picks the base level, `--verbose` raises it to debug, and each
//! `--trace` area enables trace output for the target of that name. The
//! special area `all` turns on trace everywhere. `RUST_LOG`, when set, takes
//! the place of the base level; the flag directives are added on top.

use std::fmt;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

use crate::error::ClapbindError;

/// Area name that enables trace output for every target.
pub const TRACE_ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        };
        f.write_str(s)
    }
}

/// Everything the log setup reads from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub json: bool,
    pub trace_areas: Vec<String>,
    pub verbose: bool,
}

impl LoggingSettings {
    /// The level in effect once `--verbose` is taken into account.
    pub fn effective_level(&self) -> LogLevel {
        if self.verbose {
            self.level.max(LogLevel::Debug)
        } else {
            self.level
        }
    }

    fn traces_everything(&self) -> bool {
        self.trace_areas
            .iter()
            .any(|a| a.eq_ignore_ascii_case(TRACE_ALL))
    }
}

/// Build the filter for `settings`. `env` is the value of `RUST_LOG`, if any.
pub fn build_filter(
    settings: &LoggingSettings,
    env: Option<&str>,
) -> Result<EnvFilter, ClapbindError> {
    let base = if settings.traces_everything() {
        LevelFilter::TRACE
    } else {
        settings.effective_level().as_filter()
    };

    let mut filter = match env.filter(|s| !s.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| ClapbindError::Logging(format!("invalid RUST_LOG '{directives}': {e}")))?,
        None => EnvFilter::default().add_directive(base.into()),
    };

    for area in &settings.trace_areas {
        let area = area.trim().to_ascii_lowercase();
        if area.is_empty() || area == TRACE_ALL {
            continue;
        }
        let directive = format!("{area}=trace")
            .parse()
            .map_err(|e| ClapbindError::Logging(format!("invalid trace area '{area}': {e}")))?;
        filter = filter.add_directive(directive);
    }
    if settings.traces_everything() && env.is_some() {
        filter = filter.add_directive(LevelFilter::TRACE.into());
    }
    Ok(filter)
}

/// Install a global subscriber writing to stderr.
///
/// A subscriber that is already installed (by the program or a test harness)
/// is left in place.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ClapbindError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(settings, env.as_deref())?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry
            .with(
                tracing_fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "log subscriber already installed");
    }
    Ok(())
}
