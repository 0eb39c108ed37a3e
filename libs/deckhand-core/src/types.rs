//! Core document types.

use serde::{Deserialize, Serialize};

use crate::error::{EditError, Invariant};

/// Policy for records whose column count disagrees with the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Fail the whole parse.
    #[default]
    Reject,
    /// Drop the record and report it.
    Skip,
}

impl MismatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Skip => "skip",
        }
    }

    /// Parse from a config value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub on_field_count_mismatch: MismatchPolicy,
    /// Names for the fields in order, ahead of the `columns` directive.
    pub field_names: Vec<String>,
}

/// A record dropped under [`MismatchPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub line: usize,
    pub observed: usize,
    pub expected: usize,
}

/// Whether `tag` can be stored in a space-separated tag column.
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.chars().any(char::is_whitespace)
}

/// Split tag column text, dropping repeats.
pub(crate) fn split_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in text.split_whitespace() {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// One note: its field texts and tags.
///
/// Equality ignores `origin_line`, which only serves diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    pub fields: Vec<String>,
    pub tags: Vec<String>,
    /// First source line of the record (1-based); `None` for new cards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_line: Option<usize>,
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.tags == other.tags
    }
}

impl Eq for Card {}

impl Card {
    pub fn new<I, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            tags: Vec::new(),
            origin_line: None,
        }
    }

    /// Replace the tag list. Tags are checked when the card enters a deck.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Replace one field, returning the previous text.
    pub fn set_field(&mut self, index: usize, text: impl Into<String>) -> Result<String, EditError> {
        let len = self.fields.len();
        let slot = self
            .fields
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, text.into()))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag at the end. Returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, EditError> {
        if !is_valid_tag(tag) {
            return Err(Invariant::InvalidTag { tag: tag.to_string() }.into());
        }
        if self.has_tag(tag) {
            return Ok(false);
        }
        self.tags.push(tag.to_string());
        Ok(true)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Rename `from` to `to` in place. If the card already has `to`, `from`
    /// is dropped instead.
    pub fn rename_tag(&mut self, from: &str, to: &str) -> Result<bool, EditError> {
        if !is_valid_tag(to) {
            return Err(Invariant::InvalidTag { tag: to.to_string() }.into());
        }
        let Some(pos) = self.tags.iter().position(|t| t == from) else {
            return Ok(false);
        };
        if from == to {
            return Ok(true);
        }
        if self.has_tag(to) {
            self.tags.remove(pos);
        } else {
            self.tags[pos] = to.to_string();
        }
        Ok(true)
    }
}
