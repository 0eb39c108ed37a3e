//! Command implementations.
//!
//! Every command writes its report to the given writer so tests can
//! capture it; files are only touched through [`crate::collection`].

pub mod check;
pub mod edit;
pub mod inspect;
pub mod merge;

use std::io::Write;
use std::path::Path;

use deckhand_core::Deck;

use crate::cli::Command;
use crate::collection::{write_deck, write_deck_to};
use crate::config::Settings;
use crate::error::Result;

pub fn dispatch(command: Command, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Inspect { path, json } => inspect::run(&path, json, settings, out),
        Command::Check { path } => check::run(&path, settings, out),
        Command::RenameTag {
            file,
            from,
            to,
            output,
        } => edit::rename_tag(&file, &from, &to, output.as_deref(), settings, out),
        Command::Replace {
            file,
            field,
            pattern,
            replacement,
            output,
        } => edit::replace(
            &file,
            &field,
            &pattern,
            &replacement,
            output.as_deref(),
            settings,
            out,
        ),
        Command::Remove { file, tag, output } => {
            edit::remove(&file, &tag, output.as_deref(), settings, out)
        }
        Command::Merge { paths, output } => merge::run(&paths, &output, settings, out),
    }
}

/// Write an edited deck to `output`, or to `out` when no path is given.
pub(crate) fn emit(deck: &Deck, output: Option<&Path>, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    match output {
        Some(path) => {
            let written = write_deck(deck, path, settings.line_ending, settings.force)?;
            if written != path {
                writeln!(out, "{} exists, wrote {}", path.display(), written.display())?;
            }
        }
        None => {
            write_deck_to(deck, &mut *out, settings.line_ending)?;
        }
    }
    Ok(())
}
