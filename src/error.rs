// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::action::Action;
use crate::tracker::TrackId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write config file {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Raised by a rule when a derived measurement cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("{rule}: derived signal `{signal}` is not finite")]
    NonFiniteSignal { rule: Action, signal: &'static str },
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("track {0} is not registered")]
    UnknownTrack(TrackId),

    #[error("track {0} is already registered")]
    DuplicateTrack(TrackId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("nothing to export: session has no records")]
    Empty,
}
