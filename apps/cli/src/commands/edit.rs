//! Bulk edits: `rename-tag`, `replace`, `remove`.

use std::io::Write;
use std::path::Path;

use deckhand_core::{Deck, EditError};

use crate::collection::read_deck;
use crate::commands::emit;
use crate::config::Settings;
use crate::error::{CliError, Result};

/// Rename `from` to `to` on every card. Returns the number of cards changed.
pub fn rename_tag_in(deck: &mut Deck, from: &str, to: &str) -> Result<usize> {
    let mut changed = 0;
    for index in 0..deck.len() {
        if deck.edit_card(index, |card| card.rename_tag(from, to))? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Resolve a field given by name or by 0-based index.
pub fn resolve_field(deck: &Deck, field: &str) -> Result<usize> {
    if let Some(index) = deck.field_index(field) {
        return Ok(index);
    }
    match field.parse::<usize>() {
        Ok(index) if index < deck.header().field_count() => Ok(index),
        _ => Err(CliError::FieldNotFound(field.to_string())),
    }
}

/// Replace every occurrence of `pattern` in field `field`. Returns the
/// number of cards changed.
pub fn replace_in(deck: &mut Deck, field: usize, pattern: &str, replacement: &str) -> Result<usize> {
    if pattern.is_empty() {
        return Err(CliError::InvalidArgument("pattern must not be empty".to_string()));
    }

    let mut changed = 0;
    for index in 0..deck.len() {
        let replaced = deck.edit_card(index, |card| {
            let text = card.field(field).unwrap_or_default();
            if !text.contains(pattern) {
                return Ok::<_, EditError>(false);
            }
            let updated = text.replace(pattern, replacement);
            card.set_field(field, updated)?;
            Ok(true)
        })?;
        if replaced {
            changed += 1;
        }
    }
    Ok(changed)
}

pub fn rename_tag(
    file: &Path,
    from: &str,
    to: &str,
    output: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<()> {
    let mut deck = read_deck(file, &settings.parse)?.deck;
    let changed = rename_tag_in(&mut deck, from, to)?;
    tracing::info!(from, to, changed, "renamed tag");
    emit(&deck, output, settings, out)
}

pub fn replace(
    file: &Path,
    field: &str,
    pattern: &str,
    replacement: &str,
    output: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<()> {
    let mut deck = read_deck(file, &settings.parse)?.deck;
    let index = resolve_field(&deck, field)?;
    let changed = replace_in(&mut deck, index, pattern, replacement)?;
    tracing::info!(field = index, changed, "replaced text");
    emit(&deck, output, settings, out)
}

pub fn remove(
    file: &Path,
    tag: &str,
    output: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<()> {
    let mut deck = read_deck(file, &settings.parse)?.deck;
    let removed = deck.retain_cards(|card| !card.has_tag(tag));
    tracing::info!(tag, removed, remaining = deck.len(), "removed cards");
    emit(&deck, output, settings, out)
}
