//! Command-line argument parsing for deckhand

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use deckhand_core::{LineEnding, MismatchPolicy};

/// Inspect, check and edit Anki plain-text exports
#[derive(Parser, Debug)]
#[command(name = "deckhand", version, about = "Inspect, check and edit Anki plain-text exports")]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// What to do with records whose column count is wrong: reject or skip
    #[arg(long, global = true, value_name = "POLICY", value_parser = parse_policy)]
    pub on_mismatch: Option<MismatchPolicy>,

    /// Line terminator for written files: lf or crlf
    #[arg(long, global = true, value_name = "ENDING", value_parser = parse_line_ending)]
    pub line_ending: Option<LineEnding>,

    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated field names, overriding the file's `#columns`
    #[arg(long, global = true, value_name = "NAMES", value_delimiter = ',')]
    pub field_names: Option<Vec<String>>,

    /// Log debug events
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Overwrite existing output files instead of picking a fresh name
    #[arg(long, global = true)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summarize a deck file, or every deck in a directory
    Inspect {
        path: PathBuf,

        /// Print the parsed deck as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify that decks survive a parse and write unchanged
    Check { path: PathBuf },

    /// Rename a tag on every card
    RenameTag {
        file: PathBuf,
        from: String,
        to: String,

        /// Write here instead of standard output
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Replace literal text inside one field of every card
    Replace {
        file: PathBuf,

        /// Field name or 0-based index
        #[arg(long, value_name = "NAME|INDEX")]
        field: String,

        pattern: String,
        replacement: String,

        /// Write here instead of standard output
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Remove every card carrying a tag
    Remove {
        file: PathBuf,

        #[arg(long)]
        tag: String,

        /// Write here instead of standard output
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Concatenate decks that share a layout
    Merge {
        #[arg(required = true, value_name = "PATHS")]
        paths: Vec<PathBuf>,

        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,
    },
}

fn parse_policy(value: &str) -> Result<MismatchPolicy, String> {
    MismatchPolicy::from_name(value).ok_or_else(|| format!("expected reject or skip, got {value:?}"))
}

fn parse_line_ending(value: &str) -> Result<LineEnding, String> {
    LineEnding::from_name(value).ok_or_else(|| format!("expected lf or crlf, got {value:?}"))
}
