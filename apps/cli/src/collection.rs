//! Loading and writing deck files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use deckhand_core::{
    parse_with_options, serialize, Deck, IoSink, IoSource, LineEnding, ParseOptions, ParseReport,
};

use crate::error::{CliError, Result};

/// File extensions treated as deck exports when scanning a directory.
pub const DECK_EXTENSIONS: [&str; 3] = ["txt", "tsv", "csv"];

/// Decks loaded from disk, in load order.
#[derive(Debug, Default)]
pub struct Collection {
    entries: Vec<Entry>,
}

#[derive(Debug)]
pub struct Entry {
    pub path: PathBuf,
    pub report: ParseReport,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`: a single export file, or every export directly inside
    /// a directory in file name order.
    pub fn load(path: &Path, options: &ParseOptions) -> Result<Self> {
        let mut collection = Self::new();
        collection.add_path(path, options)?;
        Ok(collection)
    }

    pub fn add_path(&mut self, path: &Path, options: &ParseOptions) -> Result<usize> {
        let files = deck_files(path)?;
        for file in &files {
            self.add_file(file, options)?;
        }
        Ok(files.len())
    }

    pub fn add_file(&mut self, path: &Path, options: &ParseOptions) -> Result<()> {
        let report = read_deck(path, options)?;
        self.entries.push(Entry {
            path: path.to_path_buf(),
            report,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Fold every deck into the first one.
    pub fn into_merged(self) -> Result<Option<Deck>> {
        let mut entries = self.entries.into_iter();
        let Some(first) = entries.next() else {
            return Ok(None);
        };
        let mut merged = first.report.deck;
        for entry in entries {
            let added = merged
                .append(entry.report.deck)
                .map_err(|source| CliError::Merge {
                    path: entry.path.clone(),
                    source,
                })?;
            tracing::debug!(path = %entry.path.display(), added, "merged deck");
        }
        Ok(Some(merged))
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// `path` itself if it is not a directory, otherwise the export files
/// directly inside it in file name order.
pub fn deck_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| CliError::io(path, e))? {
        let file = entry.map_err(|e| CliError::io(path, e))?.path();
        if file.is_file() && is_deck_file(&file) {
            files.push(file);
        }
    }
    if files.is_empty() {
        return Err(CliError::NoDecks {
            path: path.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

fn is_deck_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            DECK_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Parse a deck from bytes already read from `path`.
pub fn parse_bytes(path: &Path, bytes: &[u8], options: &ParseOptions) -> Result<ParseReport> {
    parse_with_options(IoSource::new(bytes), options).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_deck(path: &Path, options: &ParseOptions) -> Result<ParseReport> {
    let bytes = fs::read(path).map_err(|e| CliError::io(path, e))?;
    let report = parse_bytes(path, &bytes, options)?;
    tracing::info!(
        path = %path.display(),
        cards = report.deck.len(),
        skipped = report.skipped.len(),
        "read deck"
    );
    Ok(report)
}

/// Serialize `deck` into any writer.
pub fn write_deck_to<W: Write>(deck: &Deck, writer: W, ending: LineEnding) -> Result<W> {
    let mut sink = IoSink::new(writer).with_line_ending(ending);
    serialize(deck, &mut sink).map_err(|source| CliError::Serialize {
        path: PathBuf::from("-"),
        source,
    })?;
    sink.flush()?;
    Ok(sink.into_inner())
}

/// Write `deck` to `path`. Unless `force` is set, an existing file is left
/// alone and a free name next to it is used instead. The deck is serialized
/// before any file is touched. Returns the path actually written.
pub fn write_deck(deck: &Deck, path: &Path, ending: LineEnding, force: bool) -> Result<PathBuf> {
    let mut sink = IoSink::new(Vec::new()).with_line_ending(ending);
    serialize(deck, &mut sink).map_err(|source| CliError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = sink.into_inner();

    let (target, mut file) = if force {
        let file = File::create(path).map_err(|e| CliError::io(path, e))?;
        (path.to_path_buf(), file)
    } else {
        create_fresh(path)?
    };

    if let Err(e) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&target);
        return Err(CliError::io(&target, e));
    }

    tracing::info!(path = %target.display(), cards = deck.len(), "wrote deck");
    Ok(target)
}

/// Create the first free candidate name for `path`, failing over to the
/// next name when another writer got there first.
fn create_fresh(path: &Path) -> Result<(PathBuf, File)> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("deck");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    let mut suffix = 0;
    loop {
        let candidate = candidate_path(dir, stem, ext, suffix);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(CliError::io(&candidate, e)),
        }
    }
}

/// `stem.ext` for suffix 0, `stem_{suffix}.ext` otherwise.
fn candidate_path(dir: &Path, stem: &str, ext: &str, suffix: usize) -> PathBuf {
    let base = match suffix {
        0 => stem.to_string(),
        n => format!("{stem}_{n}"),
    };
    if ext.is_empty() {
        dir.join(base)
    } else {
        dir.join(format!("{base}.{ext}"))
    }
}

/// First of `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... that does not exist
/// in `dir`.
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let mut suffix = 0;
    loop {
        let candidate = candidate_path(dir, stem, ext, suffix);
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
