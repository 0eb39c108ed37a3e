//! Line-oriented source and sink abstractions.
//!
//! The codec only talks to these traits; opening and closing files belongs
//! to the caller.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Produces text one line at a time.
pub trait LineSource {
    /// Next line including its terminator, or `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Consumes text one line at a time.
pub trait LineSink {
    /// Write `line` followed by the sink's line terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

impl<T: LineSink + ?Sized> LineSink for &mut T {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

/// Appends lines terminated by `\n`.
impl LineSink for String {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push_str(line);
        self.push('\n');
        Ok(())
    }
}

/// Line source over an in-memory string.
#[derive(Debug, Clone)]
pub struct StrSource<'a> {
    rest: &'a str,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl LineSource for StrSource<'_> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.rest.is_empty() {
            return Ok(None);
        }
        let end = self.rest.find('\n').map_or(self.rest.len(), |i| i + 1);
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(Some(line.to_string()))
    }
}

/// Line source over any buffered reader.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: BufRead> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> LineSource for IoSource<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.inner.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

/// Line terminator written by [`IoSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Parse from a config value (`lf` or `crlf`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lf" => Some(Self::Lf),
            "crlf" => Some(Self::CrLf),
            _ => None,
        }
    }
}

/// Line sink over any writer.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
    ending: LineEnding,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            ending: LineEnding::Lf,
        }
    }

    pub fn with_line_ending(mut self, ending: LineEnding) -> Self {
        self.ending = ending;
        self
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> LineSink for IoSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(self.ending.as_str().as_bytes())
    }
}

/// One physical line with its terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    pub text: String,
}

/// Wraps a [`LineSource`], stripping terminators and tracking line numbers
/// and byte offsets. Supports one line of lookahead.
#[derive(Debug)]
pub struct LineReader<S> {
    source: S,
    next_number: usize,
    offset: usize,
    peeked: Option<(Line, usize)>,
}

impl<S: LineSource> LineReader<S> {
    pub fn new(source: S) -> Self {
        Self::starting_at(source, 1, 0)
    }

    /// Reader whose first line is numbered `line` and sits at byte `offset`
    /// of the original input.
    pub fn starting_at(source: S, line: usize, offset: usize) -> Self {
        Self {
            source,
            next_number: line,
            offset,
            peeked: None,
        }
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of the next unread line.
    pub fn line_number(&self) -> usize {
        self.peeked
            .as_ref()
            .map_or(self.next_number, |(line, _)| line.number)
    }

    pub fn peek_line(&mut self) -> io::Result<Option<&Line>> {
        if self.peeked.is_none() {
            self.peeked = self.fetch()?;
        }
        Ok(self.peeked.as_ref().map(|(line, _)| line))
    }

    pub fn next_line(&mut self) -> io::Result<Option<Line>> {
        let next = match self.peeked.take() {
            Some(peeked) => Some(peeked),
            None => self.fetch()?,
        };
        Ok(next.map(|(line, len)| {
            self.offset += len;
            line
        }))
    }

    fn fetch(&mut self) -> io::Result<Option<(Line, usize)>> {
        let Some(raw) = self.source.read_line()? else {
            return Ok(None);
        };
        let len = raw.len();
        let number = self.next_number;
        self.next_number += 1;

        let mut text = raw;
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        if number == 1 && self.offset == 0 && text.starts_with(BYTE_ORDER_MARK) {
            text.replace_range(..BYTE_ORDER_MARK.len_utf8(), "");
        }

        Ok(Some((Line { number, text }, len)))
    }
}
