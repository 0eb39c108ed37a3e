//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for a scratch directory holding deck files
//! - Helpers to run commands and capture their report

pub mod fixtures;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use deckhand_cli::cli::Command;
use deckhand_cli::commands;
use deckhand_cli::config::Settings;
use deckhand_cli::error::Result;

/// Scratch directory removed when the context is dropped.
pub struct TestContext {
    dir: TempDir,
    pub settings: Settings,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            settings: Settings::default(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write a file into the scratch directory and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("Failed to read output")
    }

    /// Run a command and return what it printed.
    pub fn run(&self, command: Command) -> Result<String> {
        let mut out = Vec::new();
        commands::dispatch(command, &self.settings, &mut out)?;
        Ok(String::from_utf8(out).expect("Command output is not UTF-8"))
    }
}
