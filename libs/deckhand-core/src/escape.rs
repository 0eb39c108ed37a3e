//! Backslash escape codec for field text.
//!
//! # Scheme
//! ```text
//! \\  backslash        \n  line feed        \r  carriage return
//! \t  tab              \d  the delimiter d  \#  leading '#'
//! ```
//!
//! The table is derived from one document's delimiter and passed explicitly;
//! there is no shared global table.

use std::fmt;

use crate::error::EscapeError;

const ESCAPE: char = '\\';
const DIRECTIVE_MARKER: char = '#';

/// Field text that has already been escaped.
///
/// Kept apart from `String` so an escaped field cannot be fed back into
/// [`EscapeTable::encode`] by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedField(String);

impl EncodedField {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `c` can serve as a field delimiter without colliding with the
/// escape scheme, the directive marker or the record terminator.
pub fn is_valid_delimiter(c: char) -> bool {
    !(c == ESCAPE || c == DIRECTIVE_MARKER || c == '\n' || c == '\r' || c.is_ascii_alphanumeric())
}

/// Characters with no place in a plain-text export.
fn is_representable(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{feff}' => false,
        c => !c.is_ascii_control() || c == '\u{7f}',
    }
}

/// Mapping between reserved characters and their escape sequences for one
/// delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeTable {
    delimiter: char,
}

impl EscapeTable {
    /// Build the table for `delimiter`. The caller validates the delimiter
    /// with [`is_valid_delimiter`].
    pub fn new(delimiter: char) -> Self {
        debug_assert!(is_valid_delimiter(delimiter));
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Escape `raw` so it contains no bare delimiter, newline or backslash.
    pub fn encode(&self, raw: &str) -> Result<EncodedField, EscapeError> {
        let mut out = String::with_capacity(raw.len() + 4);
        self.encode_into(raw, 0, &mut out)?;
        Ok(EncodedField(out))
    }

    /// Like [`encode`](Self::encode), and also escapes a leading `#` so the
    /// first column of a record never reads as a header directive.
    pub fn encode_leading(&self, raw: &str) -> Result<EncodedField, EscapeError> {
        match raw.strip_prefix(DIRECTIVE_MARKER) {
            Some(rest) => {
                let mut out = String::with_capacity(raw.len() + 4);
                out.push(ESCAPE);
                out.push(DIRECTIVE_MARKER);
                self.encode_into(rest, DIRECTIVE_MARKER.len_utf8(), &mut out)?;
                Ok(EncodedField(out))
            }
            None => self.encode(raw),
        }
    }

    fn encode_into(&self, raw: &str, base: usize, out: &mut String) -> Result<(), EscapeError> {
        for (offset, c) in raw.char_indices() {
            if !is_representable(c) {
                return Err(EscapeError::UnencodableCharacter {
                    offset: base + offset,
                    ch: c,
                });
            }
            match c {
                ESCAPE => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' if self.delimiter == '\t' => out.push_str("\\t"),
                c if c == self.delimiter => {
                    out.push(ESCAPE);
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        Ok(())
    }

    /// Reverse [`encode`](Self::encode).
    ///
    /// A backslash directly before a line feed is read as a literal line
    /// feed (line continuation). A backslash before any other character is
    /// kept as written, so markup such as `\(x\)` or `\frac` survives. Only
    /// a backslash at the very end is malformed.
    pub fn decode(&self, escaped: &str) -> Result<String, EscapeError> {
        let mut out = String::with_capacity(escaped.len());
        let mut chars = escaped.char_indices();

        while let Some((offset, c)) = chars.next() {
            if c != ESCAPE {
                if !is_representable(c) {
                    return Err(EscapeError::UnencodableCharacter { offset, ch: c });
                }
                out.push(c);
                continue;
            }

            let literal = match chars.next() {
                Some((_, ESCAPE)) => ESCAPE,
                Some((_, 'n')) | Some((_, '\n')) => '\n',
                Some((_, 'r')) => '\r',
                Some((_, 't')) => '\t',
                Some((_, DIRECTIVE_MARKER)) => DIRECTIVE_MARKER,
                Some((_, d)) if d == self.delimiter => d,
                Some((next, other)) => {
                    if !is_representable(other) {
                        return Err(EscapeError::UnencodableCharacter {
                            offset: next,
                            ch: other,
                        });
                    }
                    out.push(ESCAPE);
                    other
                }
                None => return Err(EscapeError::MalformedEscape { offset }),
            };
            out.push(literal);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab() -> EscapeTable {
        EscapeTable::new('\t')
    }

    #[test]
    fn encode_reserved_characters() {
        let encoded = tab().encode("a\tb\nc\\d\re").unwrap();
        assert_eq!(encoded.as_str(), "a\\tb\\nc\\\\d\\re");
    }

    #[test]
    fn encode_leaves_plain_text_alone() {
        let encoded = tab().encode("<b>bold</b> & more: 1,2;3").unwrap();
        assert_eq!(encoded.as_str(), "<b>bold</b> & more: 1,2;3");
    }

    #[test]
    fn encode_custom_delimiter() {
        let table = EscapeTable::new(';');
        assert_eq!(table.encode("x;y\tz").unwrap().as_str(), "x\\;y\tz");
        assert_eq!(table.decode("x\\;y\tz").unwrap(), "x;y\tz");
    }

    #[test]
    fn decode_inverts_encode() {
        let table = EscapeTable::new(',');
        for raw in ["", "plain", "a,b", "back\\slash", "multi\nline\r\n", "\\n literal"] {
            let encoded = table.encode(raw).unwrap();
            assert_eq!(table.decode(encoded.as_str()).unwrap(), raw);
        }
    }

    #[test]
    fn second_encode_is_visible() {
        let table = tab();
        let once = table.encode("a\tb").unwrap();
        let twice = table.encode(once.as_str()).unwrap();
        assert_ne!(once.as_str(), twice.as_str());
        assert_eq!(table.decode(twice.as_str()).unwrap(), once.as_str());
    }

    #[test]
    fn leading_marker_is_escaped() {
        let table = tab();
        let encoded = table.encode_leading("#hashtag").unwrap();
        assert_eq!(encoded.as_str(), "\\#hashtag");
        assert_eq!(table.decode(encoded.as_str()).unwrap(), "#hashtag");
        assert_eq!(table.encode_leading("no#marker").unwrap().as_str(), "no#marker");
    }

    #[test]
    fn dangling_escape_is_malformed() {
        let err = tab().decode("abc\\").unwrap_err();
        assert_eq!(err, EscapeError::MalformedEscape { offset: 3 });
    }

    #[test]
    fn unknown_escape_code_is_literal() {
        let table = tab();
        assert_eq!(table.decode("a\\qb").unwrap(), "a\\qb");
        assert_eq!(table.decode("\\(x^2\\)").unwrap(), "\\(x^2\\)");
        assert_eq!(table.decode("\\frac{1}{2}").unwrap(), "\\frac{1}{2}");
        assert_eq!(
            table.decode("\\\u{1}").unwrap_err(),
            EscapeError::UnencodableCharacter { offset: 1, ch: '\u{1}' }
        );
    }

    #[test]
    fn literal_backslash_is_escaped_on_encode() {
        let table = tab();
        let encoded = table.encode("\\(x\\)").unwrap();
        assert_eq!(encoded.as_str(), "\\\\(x\\\\)");
        assert_eq!(table.decode(encoded.as_str()).unwrap(), "\\(x\\)");
    }

    #[test]
    fn escaped_line_feed_is_continuation() {
        assert_eq!(tab().decode("one\\\ntwo").unwrap(), "one\ntwo");
    }

    #[test]
    fn control_characters_are_unencodable() {
        let err = tab().encode("ok\u{1}").unwrap_err();
        assert_eq!(err, EscapeError::UnencodableCharacter { offset: 2, ch: '\u{1}' });

        let err = tab().decode("\u{0}").unwrap_err();
        assert_eq!(err, EscapeError::UnencodableCharacter { offset: 0, ch: '\u{0}' });
    }

    #[test]
    fn delimiter_validation() {
        assert!(is_valid_delimiter('\t'));
        assert!(is_valid_delimiter(','));
        assert!(is_valid_delimiter(' '));
        assert!(!is_valid_delimiter('\\'));
        assert!(!is_valid_delimiter('#'));
        assert!(!is_valid_delimiter('\n'));
        assert!(!is_valid_delimiter('n'));
        assert!(!is_valid_delimiter('7'));
    }
}
