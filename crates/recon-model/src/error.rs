#![deny(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited input or a reference to a column that does not exist.
    #[error("format error in {origin}: {message}")]
    Format { origin: String, message: String },

    /// A key required for enrichment is absent and the miss policy is `fail`.
    #[error(
        "lookup error: key '{key}' (row {row}, column {column}) not found in mapping '{mapping}'"
    )]
    Lookup {
        mapping: String,
        key: String,
        column: String,
        row: usize,
    },

    /// A value outside the domain of a recode map or identifier rule.
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invalid task configuration: {message}")]
    Config { message: String },
}

impl ReconError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Short kind label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Format { .. } => "format",
            Self::Lookup { .. } => "lookup",
            Self::Validation { .. } => "validation",
            Self::Config { .. } => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
