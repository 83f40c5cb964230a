use std::path::PathBuf;

use thiserror::Error;

use crate::types::MergeState;

/// Boxed error returned by caller-supplied validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClapbindError {
    #[error("Flag name '{name}' is derived from both '{first}' and '{second}'")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Cannot build a field map for the {target}: {source}")]
    FieldMap {
        target: &'static str,
        source: Box<ClapbindError>,
    },

    #[error("Configuration and its clone produced different flag names")]
    ShapeMismatch,

    #[error("Flag '--{0}' is already defined on the command")]
    FlagConflict(String),

    #[error("Invalid value '{value}' for flag '--{name}': {reason}")]
    InvalidFlagValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Unknown key '{key}' in {origin} (line {line})")]
    UnknownKey {
        key: String,
        origin: String,
        line: usize,
    },

    #[error("Unknown keys in {origin}: {}", join_keys(.keys))]
    UnknownKeys {
        origin: String,
        keys: Vec<ClapbindError>,
    },

    #[error("Failed to parse {origin}: {reason}")]
    ParseError { origin: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No configuration parser defined for {0}")]
    UnknownFormat(PathBuf),

    #[error("{}", join_errors(.0))]
    Load(Vec<ClapbindError>),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    Validation(#[source] BoxError),

    #[error("{stage} failed: {source}")]
    Merge {
        stage: MergeState,
        source: Box<ClapbindError>,
    },

    #[error("Invalid logging setup: {0}")]
    Logging(String),

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("--checkcfg requested but no validator configured; call .validator() on the builder")]
    NoValidator,

    #[error("App name is required; call .app_name() on the builder")]
    AppNameRequired,
}

impl ClapbindError {
    /// The merge stage that failed, if this error came from a merge cycle.
    pub fn stage(&self) -> Option<MergeState> {
        match self {
            ClapbindError::Merge { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with merge-stage wrapping removed.
    pub fn root(&self) -> &ClapbindError {
        match self {
            ClapbindError::Merge { source, .. } | ClapbindError::FieldMap { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    pub(crate) fn at(self, stage: MergeState) -> Self {
        ClapbindError::Merge {
            stage,
            source: Box::new(self),
        }
    }
}

fn join_errors(errors: &[ClapbindError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_keys(errors: &[ClapbindError]) -> String {
    errors
        .iter()
        .map(|e| match e {
            ClapbindError::UnknownKey { key, line, .. } => format!("'{key}' (line {line})"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
