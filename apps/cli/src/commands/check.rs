//! `deckhand check`: round-trip verification.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use deckhand_core::ParseOptions;
use sha2::{Digest, Sha256};

use crate::collection::{deck_files, parse_bytes, write_deck_to};
use crate::config::Settings;
use crate::error::{CliError, Result};

/// Hex SHA-256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub path: PathBuf,
    pub cards: usize,
    pub input_sha256: String,
    pub output_sha256: String,
}

impl CheckReport {
    /// Whether writing the parsed deck reproduced the input byte for byte.
    pub fn identical(&self) -> bool {
        self.input_sha256 == self.output_sha256
    }
}

/// Parse `bytes`, write the deck back and parse that again.
pub fn check_bytes(path: &Path, bytes: &[u8], settings: &Settings) -> Result<CheckReport> {
    let report = parse_bytes(path, bytes, &settings.parse)?;
    let written = write_deck_to(&report.deck, Vec::new(), settings.line_ending)?;

    // The written copy only holds accepted records.
    let strict = ParseOptions {
        field_names: settings.parse.field_names.clone(),
        ..ParseOptions::default()
    };
    let reparsed = parse_bytes(path, &written, &strict)?;
    if reparsed.deck != report.deck {
        return Err(CliError::RoundTrip {
            path: path.to_path_buf(),
        });
    }

    Ok(CheckReport {
        path: path.to_path_buf(),
        cards: report.deck.len(),
        input_sha256: hash_bytes(bytes),
        output_sha256: hash_bytes(&written),
    })
}

pub fn run(path: &Path, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    for file in deck_files(path)? {
        let bytes = fs::read(&file).map_err(|e| CliError::io(&file, e))?;
        let report = check_bytes(&file, &bytes, settings)?;
        tracing::info!(path = %file.display(), identical = report.identical(), "checked deck");
        if report.identical() {
            writeln!(out, "{}: ok, {} cards, byte-identical", file.display(), report.cards)?;
        } else {
            writeln!(
                out,
                "{}: ok, {} cards, normalized (sha256 {} -> {})",
                file.display(),
                report.cards,
                &report.input_sha256[..12],
                &report.output_sha256[..12]
            )?;
        }
    }
    Ok(())
}
