//! Error types for deckhand-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised by the escape codec on a single field.
///
/// Offsets are byte offsets into the field text being encoded or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("malformed escape sequence at byte {offset}")]
    MalformedEscape { offset: usize },

    #[error("character {ch:?} at byte {offset} cannot be represented in an export file")]
    UnencodableCharacter { offset: usize, ch: char },
}

/// Errors that can occur while parsing an export file.
///
/// Line numbers are 1-based and columns are 0-based positions inside the
/// record line (the tag column counts as a column).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed escape sequence at line {line}, column {column}, byte {offset}")]
    MalformedEscape {
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("unsupported character {ch:?} at line {line}, column {column}")]
    UnencodableCharacter { line: usize, column: usize, ch: char },

    #[error("unknown separator {value:?} at line {line}")]
    UnknownDelimiter { line: usize, value: String },

    #[error("invalid #{key} directive at line {line}: {reason}")]
    InvalidDirective {
        line: usize,
        key: String,
        reason: String,
    },

    #[error("field count is neither declared nor inferable from a record")]
    MissingFieldCount,

    #[error("record at line {line} has {observed} columns, expected {expected}")]
    FieldCountMismatch {
        line: usize,
        observed: usize,
        expected: usize,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Attach record position to a codec error.
    pub(crate) fn from_escape(err: EscapeError, line: usize, column: usize) -> Self {
        match err {
            EscapeError::MalformedEscape { offset } => Self::MalformedEscape {
                line,
                column,
                offset,
            },
            EscapeError::UnencodableCharacter { ch, .. } => {
                Self::UnencodableCharacter { line, column, ch }
            }
        }
    }

    /// Source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedEscape { line, .. }
            | Self::UnencodableCharacter { line, .. }
            | Self::UnknownDelimiter { line, .. }
            | Self::InvalidDirective { line, .. }
            | Self::FieldCountMismatch { line, .. } => Some(*line),
            Self::MissingFieldCount | Self::Io(_) => None,
        }
    }
}

/// Errors that can occur while writing a deck.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("card {card}, column {column}: character {ch:?} cannot be represented")]
    UnencodableCharacter { card: usize, column: usize, ch: char },

    #[error(transparent)]
    Escape(#[from] EscapeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document invariants an edit may break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invariant {
    #[error("card has {found} fields, the deck requires {expected}")]
    FieldCount { expected: usize, found: usize },

    #[error("card carries tags but the deck has no tag column")]
    TagsWithoutColumn,

    #[error("tag {tag:?} is empty or contains whitespace")]
    InvalidTag { tag: String },

    #[error("tag {tag:?} appears more than once")]
    DuplicateTag { tag: String },

    #[error("directive {key:?} cannot be set as a passthrough value")]
    ReservedDirective { key: String },

    #[error("decks are incompatible: {reason}")]
    IncompatibleDeck { reason: String },
}

/// Errors surfaced by deck edit operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] Invariant),

    #[error("index {index} out of range for deck of {len} cards")]
    IndexOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_error_gains_position() {
        let err = ParseError::from_escape(EscapeError::MalformedEscape { offset: 4 }, 7, 1);
        assert!(matches!(
            err,
            ParseError::MalformedEscape {
                line: 7,
                column: 1,
                offset: 4
            }
        ));
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn mismatch_display() {
        let err = ParseError::FieldCountMismatch {
            line: 3,
            observed: 2,
            expected: 3,
        };
        assert_eq!(err.to_string(), "record at line 3 has 2 columns, expected 3");
    }

    #[test]
    fn invariant_display_is_nested() {
        let err = EditError::from(Invariant::FieldCount {
            expected: 2,
            found: 3,
        });
        assert_eq!(
            err.to_string(),
            "invariant violation: card has 3 fields, the deck requires 2"
        );
    }
}
