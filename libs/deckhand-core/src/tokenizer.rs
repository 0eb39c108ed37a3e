//! Record tokenizer.
//!
//! Splits the body into records and each record into escaped column text.
//! [`Records`] is a one-pass, single-consumer iterator: escape state can
//! span physical lines, so it cannot seek into the middle of a body. To
//! start over, build a new one with [`Records::resume`] over a source
//! positioned at the header's body offset.

use std::iter::FusedIterator;
use std::mem;

use crate::error::ParseError;
use crate::header::ExportHeader;
use crate::io::{LineReader, LineSource};

const ESCAPE: char = '\\';

/// One record with its columns still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Line the record starts on.
    pub line: usize,
    pub columns: Vec<String>,
}

/// Lazy sequence of records.
///
/// A column count mismatch is reported for the offending record only and
/// iteration continues with the next one. I/O and escape errors end the
/// sequence.
#[derive(Debug)]
pub struct Records<S> {
    reader: LineReader<S>,
    delimiter: char,
    expected: Option<usize>,
    finished: bool,
}

impl<S: LineSource> Records<S> {
    /// Tokenize the rest of `reader`. Without `expected`, the first record
    /// fixes the column count.
    pub fn new(reader: LineReader<S>, delimiter: char, expected: Option<usize>) -> Self {
        Self {
            reader,
            delimiter,
            expected,
            finished: false,
        }
    }

    /// Tokenize a body again. `source` must start at the body; `line` and
    /// `offset` are the body position recorded when the header was read.
    pub fn resume(source: S, header: &ExportHeader, line: usize, offset: usize) -> Self {
        Self::new(
            LineReader::starting_at(source, line, offset),
            header.field_delimiter(),
            Some(header.column_count()),
        )
    }

    pub fn expected_columns(&self) -> Option<usize> {
        self.expected
    }

    /// Byte offset of the next unread record.
    pub fn offset(&self) -> usize {
        self.reader.offset()
    }

    fn fail(&mut self, err: ParseError) -> Option<Result<RawRecord, ParseError>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<S: LineSource> Iterator for Records<S> {
    type Item = Result<RawRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let first = match self.reader.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(e) => return self.fail(e.into()),
        };

        let start = first.number;
        let mut last_line = first.number;
        let mut text = first.text;
        let mut columns = Vec::new();
        let mut current = String::new();

        loop {
            let mut chars = text.chars();
            let mut continued = false;

            while let Some(c) = chars.next() {
                if c == ESCAPE {
                    current.push(c);
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => continued = true,
                    }
                } else if c == self.delimiter {
                    columns.push(mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }

            if !continued {
                break;
            }

            // Backslash before the terminator: the record goes on.
            match self.reader.next_line() {
                Ok(Some(line)) => {
                    current.push('\n');
                    last_line = line.number;
                    text = line.text;
                }
                Ok(None) => {
                    return self.fail(ParseError::MalformedEscape {
                        line: last_line,
                        column: columns.len(),
                        offset: current.len() - ESCAPE.len_utf8(),
                    })
                }
                Err(e) => return self.fail(e.into()),
            }
        }
        columns.push(current);

        let observed = columns.len();
        match self.expected {
            None => self.expected = Some(observed),
            Some(expected) if expected != observed => {
                return Some(Err(ParseError::FieldCountMismatch {
                    line: start,
                    observed,
                    expected,
                }))
            }
            Some(_) => {}
        }

        Some(Ok(RawRecord {
            line: start,
            columns,
        }))
    }
}

impl<S: LineSource> FusedIterator for Records<S> {}
