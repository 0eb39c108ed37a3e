//! Directive header parsing.
//!
//! # Format
//! ```text
//! #separator:tab
//! #html:true
//! #tags column:3
//! front<TAB>back<TAB>tag1 tag2
//! ```
//!
//! Directives are read until the first line that is not `#key:value`.
//! Keys the parser does not know are kept verbatim and written back in
//! their original position. Recognized keys keep their value text as
//! written until an edit replaces them.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{ParseError, Result};
use crate::escape::{is_valid_delimiter, EscapeTable};
use crate::io::{LineReader, LineSource};

pub const DIRECTIVE_MARKER: char = '#';
const KEY_SEPARATOR: char = ':';

const KEY_SEPARATOR_SETTING: &str = "separator";
const KEY_HTML: &str = "html";
const KEY_TAGS_COLUMN: &str = "tags column";
const KEY_NOTETYPE_COLUMN: &str = "notetype column";
const KEY_DECK_COLUMN: &str = "deck column";
const KEY_GUID_COLUMN: &str = "guid column";
const KEY_COLUMNS: &str = "columns";
const KEY_NOTETYPE: &str = "notetype";
const KEY_DECK: &str = "deck";
const KEY_TAGS: &str = "tags";

const HTML_TRUE: &str = "true";
const HTML_FALSE: &str = "false";

const NOTETYPE_FIELD_NAME: &str = "Note Type";
const DECK_FIELD_NAME: &str = "Deck";
const GUID_FIELD_NAME: &str = "GUID";
const TAGS_COLUMN_NAME: &str = "Tags";

const NAMED_SEPARATORS: [(&str, char); 6] = [
    ("tab", '\t'),
    ("comma", ','),
    ("semicolon", ';'),
    ("space", ' '),
    ("pipe", '|'),
    ("colon", ':'),
];

/// One header directive.
///
/// Column numbers are 1-based, as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Directive {
    Separator { delimiter: char, spelling: String },
    Html(bool),
    TagsColumn(usize),
    NotetypeColumn(usize),
    DeckColumn(usize),
    GuidColumn(usize),
    Columns(Vec<String>),
    Notetype(String),
    Deck(String),
    Tags(Vec<String>),
    Passthrough { key: String, value: String },
}

impl Directive {
    pub fn key(&self) -> &str {
        match self {
            Self::Separator { .. } => KEY_SEPARATOR_SETTING,
            Self::Html(_) => KEY_HTML,
            Self::TagsColumn(_) => KEY_TAGS_COLUMN,
            Self::NotetypeColumn(_) => KEY_NOTETYPE_COLUMN,
            Self::DeckColumn(_) => KEY_DECK_COLUMN,
            Self::GuidColumn(_) => KEY_GUID_COLUMN,
            Self::Columns(_) => KEY_COLUMNS,
            Self::Notetype(_) => KEY_NOTETYPE,
            Self::Deck(_) => KEY_DECK,
            Self::Tags(_) => KEY_TAGS,
            Self::Passthrough { key, .. } => key,
        }
    }

    /// Value text as it appears after the `:`.
    pub fn value(&self, delimiter: char) -> String {
        match self {
            Self::Separator { spelling, .. } => spelling.clone(),
            Self::Html(true) => HTML_TRUE.to_string(),
            Self::Html(false) => HTML_FALSE.to_string(),
            Self::TagsColumn(n) | Self::NotetypeColumn(n) | Self::DeckColumn(n) | Self::GuidColumn(n) => {
                n.to_string()
            }
            Self::Columns(names) => names.join(&delimiter.to_string()),
            Self::Notetype(name) | Self::Deck(name) => name.clone(),
            Self::Tags(tags) => tags.join(" "),
            Self::Passthrough { value, .. } => value.clone(),
        }
    }

    /// Full header line without terminator.
    pub fn render(&self, delimiter: char) -> String {
        directive_line(self.key(), &self.value(delimiter))
    }
}

fn directive_line(key: &str, value: &str) -> String {
    format!("{DIRECTIVE_MARKER}{key}{KEY_SEPARATOR}{value}")
}

/// Resolve a `separator` value to a delimiter character.
pub fn parse_separator(value: &str) -> Option<char> {
    let trimmed = value.trim();
    let named = NAMED_SEPARATORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map(|(_, c)| *c);

    let delimiter = named.or_else(|| single_char(value)).or_else(|| single_char(trimmed))?;
    is_valid_delimiter(delimiter).then_some(delimiter)
}

/// Preferred spelling for a delimiter when writing a fresh header.
pub fn separator_spelling(delimiter: char) -> String {
    NAMED_SEPARATORS
        .iter()
        .find(|(_, c)| *c == delimiter)
        .map_or_else(|| delimiter.to_string(), |(name, _)| name.to_string())
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Split a directive line into key and value.
fn split_directive(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix(DIRECTIVE_MARKER)?.split_once(KEY_SEPARATOR)
}

/// Directives read from the top of a file, before the column count is known.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    /// Line number, directive and the value text as written.
    entries: Vec<(usize, Directive, String)>,
    body_offset: usize,
    body_line: usize,
}

impl HeaderBlock {
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter().map(|(_, d, _)| d)
    }

    /// Byte offset at which the record body starts.
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// Line number of the first body line.
    pub fn body_line(&self) -> usize {
        self.body_line
    }

    pub fn delimiter(&self) -> char {
        self.directives()
            .filter_map(|d| match d {
                Directive::Separator { delimiter, .. } => Some(*delimiter),
                _ => None,
            })
            .last()
            .unwrap_or('\t')
    }

    /// Column count fixed by a `columns` directive.
    pub fn declared_columns(&self) -> Option<usize> {
        self.directives()
            .filter_map(|d| match d {
                Directive::Columns(names) => Some(names.len()),
                _ => None,
            })
            .last()
    }

    fn last_column(&self, pick: fn(&Directive) -> Option<usize>) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .filter_map(|(line, d, _)| pick(d).map(|n| (*line, n)))
            .last()
    }
}

/// Read directive lines from the front of `reader`, leaving it positioned
/// at the first body line.
pub fn read_header<S: LineSource>(reader: &mut LineReader<S>) -> Result<HeaderBlock> {
    let mut raw = Vec::new();

    loop {
        let Some(line) = reader.peek_line()? else {
            break;
        };
        let Some((key, value)) = split_directive(&line.text) else {
            break;
        };
        raw.push((line.number, key.to_string(), value.to_string()));
        reader.next_line()?;
    }

    let mut delimiter = '\t';
    for (line, key, value) in &raw {
        if key == KEY_SEPARATOR_SETTING {
            delimiter = parse_separator(value).ok_or_else(|| ParseError::UnknownDelimiter {
                line: *line,
                value: value.clone(),
            })?;
        }
    }

    let entries = raw
        .into_iter()
        .map(|(line, key, value)| {
            let directive = typed_directive(line, key, value.clone(), delimiter)?;
            Ok((line, directive, value))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(directives = entries.len(), "read export header");

    Ok(HeaderBlock {
        entries,
        body_offset: reader.offset(),
        body_line: reader.line_number(),
    })
}

fn typed_directive(line: usize, key: String, value: String, delimiter: char) -> Result<Directive> {
    let directive = match key.as_str() {
        KEY_SEPARATOR_SETTING => Directive::Separator {
            delimiter,
            spelling: value,
        },
        KEY_HTML => match value.trim() {
            HTML_TRUE => Directive::Html(true),
            HTML_FALSE => Directive::Html(false),
            other => {
                return Err(ParseError::InvalidDirective {
                    line,
                    key,
                    reason: format!("expected {HTML_TRUE} or {HTML_FALSE}, got {other:?}"),
                })
            }
        },
        KEY_TAGS_COLUMN => Directive::TagsColumn(column_number(line, &key, &value)?),
        KEY_NOTETYPE_COLUMN => Directive::NotetypeColumn(column_number(line, &key, &value)?),
        KEY_DECK_COLUMN => Directive::DeckColumn(column_number(line, &key, &value)?),
        KEY_GUID_COLUMN => Directive::GuidColumn(column_number(line, &key, &value)?),
        KEY_COLUMNS => Directive::Columns(value.split(delimiter).map(str::to_string).collect()),
        KEY_NOTETYPE => Directive::Notetype(value),
        KEY_DECK => Directive::Deck(value),
        KEY_TAGS => Directive::Tags(value.split_whitespace().map(str::to_string).collect()),
        _ => Directive::Passthrough { key, value },
    };
    Ok(directive)
}

fn column_number(line: usize, key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ParseError::InvalidDirective {
            line,
            key: key.to_string(),
            reason: format!("expected a column number starting at 1, got {value:?}"),
        }),
    }
}

/// Resolved document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportHeader {
    field_delimiter: char,
    html_enabled: bool,
    tag_column_index: Option<usize>,
    field_count: usize,
    directives: Vec<Directive>,
    /// Value text for each directive whose spelling differs from the
    /// rendered value.
    #[serde(skip)]
    spellings: Vec<Option<String>>,
    /// Caller-supplied field names, one per field.
    #[serde(skip)]
    supplied_names: Vec<String>,
}

impl ExportHeader {
    /// Fresh header with `field_count` note fields.
    ///
    /// Returns `None` for a zero field count or a delimiter that collides
    /// with the escape scheme.
    pub fn new(field_delimiter: char, field_count: usize) -> Option<Self> {
        if field_count == 0 || !is_valid_delimiter(field_delimiter) {
            return None;
        }
        Some(Self {
            field_delimiter,
            html_enabled: false,
            tag_column_index: None,
            field_count,
            directives: vec![Directive::Separator {
                delimiter: field_delimiter,
                spelling: separator_spelling(field_delimiter),
            }],
            spellings: vec![None],
            supplied_names: Vec::new(),
        })
    }

    /// Add a tag column at 0-based `index` of the record line.
    ///
    /// Returns `None` if `index` is past the end of the record.
    pub fn with_tag_column(mut self, index: usize) -> Option<Self> {
        let columns = self.field_count + 1;
        if index >= columns || self.tag_column_index.is_some() {
            return None;
        }
        self.tag_column_index = Some(index);
        self.upsert(Directive::TagsColumn(index + 1));
        Some(self)
    }

    pub fn with_html(mut self, enabled: bool) -> Self {
        self.set_html_enabled(enabled);
        self
    }

    /// Name fields in order, ahead of the `columns` directive. Empty names
    /// fall through to the directive or the generic name.
    pub fn with_field_names<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.supplied_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Build the header from a directive block. `inferred_columns` is the
    /// column count of the first record, if there is one.
    pub fn resolve(block: HeaderBlock, inferred_columns: Option<usize>) -> Result<Self> {
        let field_delimiter = block.delimiter();
        let html_enabled = block
            .directives()
            .filter_map(|d| match d {
                Directive::Html(enabled) => Some(*enabled),
                _ => None,
            })
            .last()
            .unwrap_or(false);

        let columns = block
            .declared_columns()
            .or(inferred_columns)
            .ok_or(ParseError::MissingFieldCount)?;

        let tags = block.last_column(|d| match d {
            Directive::TagsColumn(n) => Some(*n),
            _ => None,
        });
        let special = [
            block.last_column(|d| match d {
                Directive::NotetypeColumn(n) => Some(*n),
                _ => None,
            }),
            block.last_column(|d| match d {
                Directive::DeckColumn(n) => Some(*n),
                _ => None,
            }),
            block.last_column(|d| match d {
                Directive::GuidColumn(n) => Some(*n),
                _ => None,
            }),
        ];

        let keys = [KEY_TAGS_COLUMN, KEY_NOTETYPE_COLUMN, KEY_DECK_COLUMN, KEY_GUID_COLUMN];
        let mut taken = HashSet::new();
        for (key, entry) in keys.iter().zip(std::iter::once(tags).chain(special)) {
            let Some((line, n)) = entry else { continue };
            if n > columns {
                return Err(ParseError::InvalidDirective {
                    line,
                    key: key.to_string(),
                    reason: format!("column {n} is past the last column ({columns})"),
                });
            }
            if !taken.insert(n) {
                return Err(ParseError::InvalidDirective {
                    line,
                    key: key.to_string(),
                    reason: format!("column {n} is already assigned"),
                });
            }
        }

        let tag_column_index = tags.map(|(_, n)| n - 1);
        let field_count = columns - usize::from(tag_column_index.is_some());
        if field_count == 0 {
            return Err(ParseError::MissingFieldCount);
        }

        let (directives, spellings): (Vec<_>, Vec<_>) = block
            .entries
            .into_iter()
            .map(|(_, directive, raw)| {
                let spelling = (directive.value(field_delimiter) != raw).then_some(raw);
                (directive, spelling)
            })
            .unzip();

        Ok(Self {
            field_delimiter,
            html_enabled,
            tag_column_index,
            field_count,
            directives,
            spellings,
            supplied_names: Vec::new(),
        })
    }

    pub fn field_delimiter(&self) -> char {
        self.field_delimiter
    }

    pub fn html_enabled(&self) -> bool {
        self.html_enabled
    }

    pub fn tag_column_index(&self) -> Option<usize> {
        self.tag_column_index
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Columns per record line, including the tag column.
    pub fn column_count(&self) -> usize {
        self.field_count + usize::from(self.tag_column_index.is_some())
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn escape_table(&self) -> EscapeTable {
        EscapeTable::new(self.field_delimiter)
    }

    /// Field index stored in a record column; `None` for the tag column.
    pub fn column_field(&self, column: usize) -> Option<usize> {
        match self.tag_column_index {
            Some(tags) if column == tags => None,
            Some(tags) if column > tags => Some(column - 1),
            _ => Some(column),
        }
    }

    /// Record column holding field `field`.
    pub fn field_column(&self, field: usize) -> usize {
        match self.tag_column_index {
            Some(tags) if field >= tags => field + 1,
            _ => field,
        }
    }

    fn special_field(&self, pick: fn(&Directive) -> Option<usize>) -> Option<usize> {
        self.directives
            .iter()
            .filter_map(pick)
            .last()
            .and_then(|n| self.column_field(n - 1))
    }

    /// Field holding the per-note notetype name.
    pub fn notetype_field(&self) -> Option<usize> {
        self.special_field(|d| match d {
            Directive::NotetypeColumn(n) => Some(*n),
            _ => None,
        })
    }

    /// Field holding the per-note deck name.
    pub fn deck_field(&self) -> Option<usize> {
        self.special_field(|d| match d {
            Directive::DeckColumn(n) => Some(*n),
            _ => None,
        })
    }

    /// Field holding the note GUID.
    pub fn guid_field(&self) -> Option<usize> {
        self.special_field(|d| match d {
            Directive::GuidColumn(n) => Some(*n),
            _ => None,
        })
    }

    /// File-wide notetype from `#notetype:`.
    pub fn notetype(&self) -> Option<&str> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::Notetype(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// File-wide deck from `#deck:`.
    pub fn deck(&self) -> Option<&str> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::Deck(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Tags from `#tags:`, applied by the application to every note.
    pub fn global_tags(&self) -> &[String] {
        self.directives
            .iter()
            .rev()
            .find_map(|d| match d {
                Directive::Tags(tags) => Some(tags.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// One unique name per field.
    ///
    /// Special columns get their reserved names; other fields use the
    /// supplied names, then the `columns` directive, then `Field{index}`.
    pub fn field_names(&self) -> Vec<String> {
        self.name_fields().0
    }

    /// Field names plus every conflict met while assigning them.
    pub fn name_fields(&self) -> (Vec<String>, Vec<NameConflict>) {
        let declared: Option<&Vec<String>> = self.directives.iter().rev().find_map(|d| match d {
            Directive::Columns(names) => Some(names),
            _ => None,
        });
        let reserved = [
            (self.notetype_field(), NOTETYPE_FIELD_NAME),
            (self.deck_field(), DECK_FIELD_NAME),
            (self.guid_field(), GUID_FIELD_NAME),
        ];

        let mut seen: HashSet<String> = reserved
            .iter()
            .filter(|(field, _)| field.is_some())
            .map(|(_, name)| name.to_string())
            .collect();
        seen.insert(TAGS_COLUMN_NAME.to_string());

        let mut conflicts = Vec::new();
        let mut names = Vec::with_capacity(self.field_count);
        for field in 0..self.field_count {
            let requested = self
                .supplied_names
                .get(field)
                .filter(|name| !name.is_empty())
                .or_else(|| declared.and_then(|names| names.get(self.field_column(field))))
                .filter(|name| !name.is_empty());

            if let Some((_, reserved_name)) = reserved.iter().find(|(f, _)| *f == Some(field)) {
                if let Some(requested) = requested.filter(|name| name.as_str() != *reserved_name) {
                    conflicts.push(NameConflict::Reserved {
                        field,
                        requested: requested.clone(),
                        reserved: *reserved_name,
                    });
                }
                names.push(reserved_name.to_string());
                continue;
            }

            let name = match requested {
                Some(name) if !seen.contains(name) => name.clone(),
                Some(name) => {
                    let assigned = generic_name(field, &seen);
                    conflicts.push(NameConflict::Duplicate {
                        field,
                        requested: name.clone(),
                        assigned: assigned.clone(),
                    });
                    assigned
                }
                None => generic_name(field, &seen),
            };
            seen.insert(name.clone());
            names.push(name);
        }

        if self.supplied_names.len() > self.field_count {
            conflicts.push(NameConflict::Leftover(
                self.supplied_names[self.field_count..].to_vec(),
            ));
        }
        (names, conflicts)
    }

    pub(crate) fn set_field_names(&mut self, names: Vec<String>) {
        self.supplied_names = names;
    }

    pub(crate) fn set_html_enabled(&mut self, enabled: bool) {
        self.html_enabled = enabled;
        self.upsert(Directive::Html(enabled));
    }

    /// Set an unrecognized directive. Recognized keys are rejected with
    /// `false` since they would bypass validation.
    pub(crate) fn set_passthrough(&mut self, key: &str, value: &str) -> bool {
        let candidate = format!("{DIRECTIVE_MARKER}{key}{KEY_SEPARATOR}{value}");
        let passthrough = matches!(
            split_directive(&candidate),
            Some((k, v)) if k == key && v == value
        );
        let known = typed_directive(0, key.to_string(), String::new(), self.field_delimiter)
            .map_or(true, |d| !matches!(d, Directive::Passthrough { .. }));
        let multiline = key.contains(['\n', '\r']) || value.contains(['\n', '\r']);
        if key.is_empty() || !passthrough || known || multiline {
            return false;
        }
        self.upsert(Directive::Passthrough {
            key: key.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Replace the last directive with the same key, or append.
    fn upsert(&mut self, directive: Directive) {
        match self.directives.iter().rposition(|d| d.key() == directive.key()) {
            Some(pos) => {
                self.directives[pos] = directive;
                self.spellings[pos] = None;
            }
            None => {
                self.directives.push(directive);
                self.spellings.push(None);
            }
        }
    }

    /// Header lines for output. With `synthesize_columns`, a `columns`
    /// directive is appended when none exists so the column count survives
    /// a deck without records.
    pub fn render_lines(&self, synthesize_columns: bool) -> Vec<String> {
        let mut lines: Vec<String> = self
            .directives
            .iter()
            .zip(&self.spellings)
            .map(|(d, spelling)| match spelling {
                Some(raw) => directive_line(d.key(), raw),
                None => d.render(self.field_delimiter),
            })
            .collect();

        let has_columns = self
            .directives
            .iter()
            .any(|d| matches!(d, Directive::Columns(_)));
        if synthesize_columns && !has_columns {
            let mut names: Vec<String> = (0..self.field_count).map(|n| format!("Field{n}")).collect();
            if let Some(tags) = self.tag_column_index {
                names.insert(tags, TAGS_COLUMN_NAME.to_string());
            }
            lines.push(Directive::Columns(names).render(self.field_delimiter));
        }
        lines
    }
}

/// Problem met while naming fields. The field still gets a unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameConflict {
    /// A name was requested for a special column, which keeps its own.
    Reserved {
        field: usize,
        requested: String,
        reserved: &'static str,
    },
    /// The requested name is taken; the field got `assigned` instead.
    Duplicate {
        field: usize,
        requested: String,
        assigned: String,
    },
    /// More names were supplied than there are fields.
    Leftover(Vec<String>),
}

impl fmt::Display for NameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved {
                field,
                requested,
                reserved,
            } => write!(f, "field {field} is the {reserved:?} column, ignoring name {requested:?}"),
            Self::Duplicate {
                field,
                requested,
                assigned,
            } => write!(f, "field name {requested:?} is already taken, field {field} named {assigned:?}"),
            Self::Leftover(names) => write!(f, "more field names than fields, unused: {names:?}"),
        }
    }
}

fn generic_name(field: usize, seen: &HashSet<String>) -> String {
    let base = format!("Field{field}");
    if !seen.contains(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let name = format!("{base}.{n}");
        if !seen.contains(&name) {
            return name;
        }
        n += 1;
    }
}
