//! Error types for recdiff-core

use std::fmt;
use thiserror::Error;

/// Which snapshot a record or header belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RecdiffError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Key column '{column}' is not present in the {side} source")]
    MissingKeyColumn { column: String, side: Side },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to write configuration: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl RecdiffError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    pub fn missing_key_column<S: Into<String>>(column: S, side: Side) -> Self {
        Self::MissingKeyColumn {
            column: column.into(),
            side,
        }
    }

    /// True for every error kind that stems from how a comparison was requested
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::MissingKeyColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RecdiffError>;
