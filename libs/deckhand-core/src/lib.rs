//! Codec for Anki plain-text note exports.
//!
//! Provides:
//! - Header directive parsing (`#separator:`, `#html:`, `#tags column:` ...)
//! - Backslash escape codec for field text
//! - Streaming record tokenizer over any line source
//! - Editable `Deck` document with validated card edits
//! - Serializer whose output parses back to an equal deck

pub mod builder;
pub mod deck;
pub mod error;
pub mod escape;
pub mod header;
pub mod io;
pub mod media;
pub mod serializer;
pub mod tokenizer;
pub mod types;

pub use builder::{parse, parse_str, parse_with_options, ParseReport};
pub use deck::Deck;
pub use error::{EditError, EscapeError, Invariant, ParseError, Result, SerializeError};
pub use escape::{is_valid_delimiter, EncodedField, EscapeTable};
pub use header::{read_header, Directive, ExportHeader, HeaderBlock, NameConflict};
pub use io::{IoSink, IoSource, LineEnding, LineSink, LineSource, StrSource};
pub use media::{MediaKind, MediaRef};
pub use serializer::{serialize, serialize_to_string};
pub use tokenizer::{RawRecord, Records};
pub use types::{Card, MismatchPolicy, ParseOptions, SkippedRecord};
