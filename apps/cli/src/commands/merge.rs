//! `deckhand merge`: concatenate decks sharing a layout.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::collection::{write_deck, Collection};
use crate::config::Settings;
use crate::error::{CliError, Result};

pub fn run(paths: &[PathBuf], output: &Path, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let mut collection = Collection::new();
    for path in paths {
        collection.add_path(path, &settings.parse)?;
    }
    let sources = collection.len();

    let merged = collection.into_merged()?.ok_or_else(|| CliError::NoDecks {
        path: output.to_path_buf(),
    })?;
    let written = write_deck(&merged, output, settings.line_ending, settings.force)?;

    tracing::info!(sources, cards = merged.len(), "merged decks");
    writeln!(
        out,
        "merged {sources} decks, {} cards into {}",
        merged.len(),
        written.display()
    )?;
    Ok(())
}
