//! repofetch configuration file handling
//!
//! Loads the optional ~/.config/repofetch/config.yaml. Every field has a
//! default, so a missing file and an empty file behave the same.
//!
//! ```yaml
//! github:
//!   api_url: https://github.example.com
//! fetch:
//!   output: ~/mirrors
//!   ignore_forks: true
//! ```

use super::fetch_options::FetchOptions;
use crate::github::client::DEFAULT_API_URL;
use crate::{RepoFetchError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where and how to reach GitHub
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// github.com, an Enterprise host, or an API root
    pub api_url: String,

    /// API token. Prefer the GITHUB_TOKEN environment variable.
    pub token: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
        }
    }
}

/// Contents of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepofetchConfig {
    pub github: GitHubSettings,

    /// Defaults for every run; command-line flags override them
    pub fetch: FetchOptions,
}

impl RepofetchConfig {
    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RepoFetchError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Loading repofetch configuration");

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load `path` if given, else the default path if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// ~/.config/repofetch/config.yaml
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("repofetch");
        path.push("config.yaml");
        path
    }
}
