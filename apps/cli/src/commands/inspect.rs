//! `deckhand inspect`: header and content summary.

use std::io::Write;
use std::path::{Path, PathBuf};

use deckhand_core::header::separator_spelling;
use deckhand_core::Deck;
use serde::Serialize;

use crate::collection::{Collection, Entry};
use crate::config::Settings;
use crate::error::Result;

/// Summary of one deck file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckSummary {
    pub path: PathBuf,
    pub separator: String,
    pub html: bool,
    pub fields: Vec<String>,
    /// 1-based, as written in the header.
    pub tags_column: Option<usize>,
    pub notetype: Option<String>,
    pub deck: Option<String>,
    pub cards: usize,
    pub tags: Vec<String>,
    pub media: Vec<String>,
    pub skipped: usize,
}

impl DeckSummary {
    pub fn new(path: &Path, deck: &Deck, skipped: usize) -> Self {
        let header = deck.header();
        let mut tags: Vec<String> = header.global_tags().to_vec();
        for tag in deck.iter().flat_map(|card| card.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }

        Self {
            path: path.to_path_buf(),
            separator: separator_spelling(header.field_delimiter()),
            html: header.html_enabled(),
            fields: header.field_names(),
            tags_column: header.tag_column_index().map(|i| i + 1),
            notetype: header.notetype().map(str::to_string),
            deck: header.deck().map(str::to_string),
            cards: deck.len(),
            tags,
            media: deck.media_references(),
            skipped,
        }
    }

    fn from_entry(entry: &Entry) -> Self {
        Self::new(&entry.path, &entry.report.deck, entry.report.skipped.len())
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "{}", self.path.display())?;
        writeln!(out, "  separator: {}", self.separator)?;
        writeln!(out, "  html: {}", self.html)?;
        writeln!(out, "  fields: {}", self.fields.join(", "))?;
        if let Some(column) = self.tags_column {
            writeln!(out, "  tags column: {column}")?;
        }
        if let Some(notetype) = &self.notetype {
            writeln!(out, "  notetype: {notetype}")?;
        }
        if let Some(deck) = &self.deck {
            writeln!(out, "  deck: {deck}")?;
        }
        writeln!(out, "  cards: {}", self.cards)?;
        if !self.tags.is_empty() {
            writeln!(out, "  tags: {}", self.tags.join(" "))?;
        }
        if !self.media.is_empty() {
            writeln!(out, "  media: {}", self.media.join(", "))?;
        }
        if self.skipped > 0 {
            writeln!(out, "  skipped records: {}", self.skipped)?;
        }
        Ok(())
    }
}

pub fn run(path: &Path, json: bool, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let collection = Collection::load(path, &settings.parse)?;

    if json {
        let decks: Vec<&Deck> = collection.iter().map(|e| &e.report.deck).collect();
        match decks.as_slice() {
            [single] => serde_json::to_writer_pretty(&mut *out, single)?,
            many => serde_json::to_writer_pretty(&mut *out, many)?,
        }
        writeln!(out)?;
        return Ok(());
    }

    for entry in &collection {
        DeckSummary::from_entry(entry).write_text(out)?;
    }
    Ok(())
}
