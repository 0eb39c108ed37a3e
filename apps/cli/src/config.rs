//! Settings resolution.
//!
//! Precedence, lowest first: built-in defaults, the `--config` JSON file,
//! `DECKHAND_*` environment variables, command-line flags.

use std::fs;
use std::path::Path;

use deckhand_core::{LineEnding, MismatchPolicy, ParseOptions};
use serde::{Deserialize, Serialize};

use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};

pub const ENV_ON_MISMATCH: &str = "DECKHAND_ON_MISMATCH";
pub const ENV_LINE_ENDING: &str = "DECKHAND_LINE_ENDING";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub parse: ParseOptions,
    pub line_ending: LineEnding,
    /// Overwrite existing output files.
    pub force: bool,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.apply_args(args);
        tracing::debug!(?settings, "resolved settings");
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ON_MISMATCH) {
            self.parse.on_field_count_mismatch = MismatchPolicy::from_name(&value)
                .ok_or_else(|| CliError::Config(format!("{ENV_ON_MISMATCH}={value}")))?;
        }
        if let Some(value) = lookup(ENV_LINE_ENDING) {
            self.line_ending = LineEnding::from_name(&value)
                .ok_or_else(|| CliError::Config(format!("{ENV_LINE_ENDING}={value}")))?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &GlobalArgs) {
        if let Some(policy) = args.on_mismatch {
            self.parse.on_field_count_mismatch = policy;
        }
        if let Some(ending) = args.line_ending {
            self.line_ending = ending;
        }
        if let Some(names) = &args.field_names {
            self.parse.field_names = names.clone();
        }
        self.force |= args.force;
    }
}
