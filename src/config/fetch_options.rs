//! Per-run options
//!
//! Mirrors the invocation contract of a run: which files to fetch, where to
//! put them, and which repositories to skip.

use crate::{RepoFetchError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options for one repository run.
///
/// Defaults: no source, output is the current working directory, archived
/// repositories are skipped, everything else is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// File path or glob to download (required)
    pub source: Option<String>,

    /// Destination root; a leading `~` is expanded at write time
    pub output: Option<PathBuf>,

    /// Skip archived repositories
    pub ignore_archived: bool,

    /// Skip forks
    pub ignore_forks: bool,

    /// Skip public repositories
    pub ignore_public: bool,

    /// Skip private repositories
    pub ignore_private: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            source: None,
            output: std::env::current_dir().ok(),
            ignore_archived: true,
            ignore_forks: false,
            ignore_public: false,
            ignore_private: false,
        }
    }
}

impl FetchOptions {
    /// Options for `source`, everything else default
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// The source specifier, or a configuration error if it is missing or empty
    pub fn require_source(&self) -> Result<&str> {
        match self.source.as_deref() {
            Some(source) if !source.is_empty() => Ok(source),
            _ => Err(RepoFetchError::Config(
                "Please specify a source file to download with --source=README.md".to_string(),
            )),
        }
    }

    /// The destination root, or a configuration error if it is missing or empty
    pub fn require_output(&self) -> Result<&Path> {
        match self.output.as_deref() {
            Some(output) if !output.as_os_str().is_empty() => Ok(output),
            _ => Err(RepoFetchError::Config(
                "Please specify a destination directory with --output=./out".to_string(),
            )),
        }
    }

    /// Check that both required options are present
    pub fn validate(&self) -> Result<()> {
        self.require_source()?;
        self.require_output()?;
        Ok(())
    }
}
