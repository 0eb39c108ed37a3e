//! Error handling for the deckhand commands

use std::path::PathBuf;

use deckhand_core::{EditError, ParseError, SerializeError};
use thiserror::Error;

/// Command error types
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Write error for {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: SerializeError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),

    #[error("Cannot merge {}: {source}", .path.display())]
    Merge {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("Round trip failed for {}", .path.display())]
    RoundTrip { path: PathBuf },

    #[error("No field named {0:?}")]
    FieldNotFound(String),

    #[error("No decks found in {}", .path.display())]
    NoDecks { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CliError>;
