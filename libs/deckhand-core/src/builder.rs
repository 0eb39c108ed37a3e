//! Deck builder.
//!
//! Drives the header reader and the tokenizer, decodes every column and
//! assembles cards. The header is resolved after the first accepted
//! record so an undeclared field count can be inferred from it.

use crate::deck::Deck;
use crate::error::{ParseError, Result};
use crate::header::{read_header, ExportHeader};
use crate::io::{LineReader, LineSource, StrSource};
use crate::tokenizer::{RawRecord, Records};
use crate::types::{split_tags, Card, MismatchPolicy, ParseOptions, SkippedRecord};

/// Deck plus the records dropped while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub deck: Deck,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse an export with default options.
///
/// # Example
///
/// ```
/// use deckhand_core::parse_str;
///
/// let deck = parse_str("#separator:tab\n#html:true\nfront\tback\n").unwrap();
/// assert_eq!(deck.len(), 1);
/// assert_eq!(deck.cards()[0].fields, vec!["front", "back"]);
/// ```
pub fn parse<S: LineSource>(source: S) -> Result<Deck> {
    parse_with_options(source, &ParseOptions::default()).map(|report| report.deck)
}

pub fn parse_str(text: &str) -> Result<Deck> {
    parse(StrSource::new(text))
}

/// Parse an export, applying `options` to malformed records.
pub fn parse_with_options<S: LineSource>(source: S, options: &ParseOptions) -> Result<ParseReport> {
    let mut reader = LineReader::new(source);
    let block = read_header(&mut reader)?;
    let mut records = Records::new(reader, block.delimiter(), block.declared_columns());
    let policy = options.on_field_count_mismatch;
    let mut skipped = Vec::new();

    let first = next_record(&mut records, policy, &mut skipped)?;
    let mut header = ExportHeader::resolve(block, first.as_ref().map(|r| r.columns.len()))?;
    header.set_field_names(options.field_names.clone());
    for conflict in header.name_fields().1 {
        tracing::warn!(%conflict, "field name conflict");
    }

    let mut cards = Vec::new();
    let mut pending = first;
    while let Some(record) = pending {
        cards.push(decode_record(&header, record)?);
        pending = next_record(&mut records, policy, &mut skipped)?;
    }

    tracing::debug!(
        cards = cards.len(),
        skipped = skipped.len(),
        fields = header.field_count(),
        "parsed deck"
    );

    Ok(ParseReport {
        deck: Deck::from_parts(header, cards),
        skipped,
    })
}

/// Next record that passes the column count check.
fn next_record<S: LineSource>(
    records: &mut Records<S>,
    policy: MismatchPolicy,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<Option<RawRecord>> {
    for item in records.by_ref() {
        match item {
            Ok(record) => return Ok(Some(record)),
            Err(ParseError::FieldCountMismatch {
                line,
                observed,
                expected,
            }) if policy == MismatchPolicy::Skip => {
                tracing::warn!(line, observed, expected, "skipping record with wrong column count");
                skipped.push(SkippedRecord {
                    line,
                    observed,
                    expected,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

fn decode_record(header: &ExportHeader, record: RawRecord) -> Result<Card> {
    let table = header.escape_table();
    let mut fields = Vec::with_capacity(header.field_count());
    let mut tags = Vec::new();

    for (column, text) in record.columns.iter().enumerate() {
        let decoded = table
            .decode(text)
            .map_err(|e| ParseError::from_escape(e, record.line, column))?;
        match header.column_field(column) {
            Some(_) => fields.push(decoded),
            None => tags = split_tags(&decoded),
        }
    }

    Ok(Card {
        fields,
        tags,
        origin_line: Some(record.line),
    })
}
