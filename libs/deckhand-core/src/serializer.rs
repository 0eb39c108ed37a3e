//! Deck serializer.
//!
//! Writes header directives in their stored order, then one line per card.
//! Output always parses back to an equal deck.

use std::borrow::Cow;

use crate::deck::Deck;
use crate::error::{EscapeError, SerializeError};
use crate::io::LineSink;

const TAG_SEPARATOR: &str = " ";

/// Write `deck` to `sink`.
pub fn serialize<S: LineSink>(deck: &Deck, mut sink: S) -> Result<(), SerializeError> {
    let header = deck.header();
    for line in header.render_lines(deck.is_empty()) {
        sink.write_line(&line)?;
    }

    let table = header.escape_table();
    let delimiter = header.field_delimiter();
    let mut line = String::new();

    for (index, card) in deck.iter().enumerate() {
        line.clear();
        for column in 0..header.column_count() {
            if column > 0 {
                line.push(delimiter);
            }
            let raw: Cow<'_, str> = match header.column_field(column) {
                Some(field) => Cow::Borrowed(card.field(field).unwrap_or_default()),
                None => Cow::Owned(card.tags.join(TAG_SEPARATOR)),
            };
            let encoded = if column == 0 {
                table.encode_leading(&raw)
            } else {
                table.encode(&raw)
            };
            let encoded = encoded.map_err(|err| match err {
                EscapeError::UnencodableCharacter { ch, .. } => SerializeError::UnencodableCharacter {
                    card: index,
                    column,
                    ch,
                },
                other => SerializeError::Escape(other),
            })?;
            line.push_str(encoded.as_str());
        }
        sink.write_line(&line)?;
    }

    tracing::debug!(cards = deck.len(), "serialized deck");
    Ok(())
}

/// Serialize into a string with `\n` line endings.
pub fn serialize_to_string(deck: &Deck) -> Result<String, SerializeError> {
    let mut out = String::new();
    serialize(deck, &mut out)?;
    Ok(out)
}
