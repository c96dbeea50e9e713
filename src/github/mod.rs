//! Remote repository access
//!
//! The pipeline only needs two things from the hosting service: the raw bytes
//! of one file at the default branch tip, and the recursive tree listing of
//! that tip. [`RepositoryApi`] is that seam; [`GitHubClient`] implements it
//! over the GitHub REST API.
//!
//! Missing files and empty repositories are expected outcomes and are
//! returned as values ([`FileContent::NotFound`], [`TreeListing::EmptyRepository`]),
//! never as errors.

pub mod client;
pub mod retry;

pub use client::GitHubClient;
pub use retry::{with_retry, RetryConfig, RetryDecision, RetryableError};

use crate::{RepoFetchError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// A repository as supplied by the driver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// Owner login (user or organization)
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            archived: false,
            fork: false,
            private: false,
            default_branch: None,
        }
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Split an `owner/name` argument into its owner and name
    pub fn parse_full_name(full_name: &str) -> Result<(String, String)> {
        let trimmed = full_name.trim().trim_end_matches(".git");
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => Err(RepoFetchError::Config(format!(
                "Invalid repository '{}': expected OWNER/REPO",
                full_name
            ))),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule pointer
    Commit,
    #[serde(other)]
    Other,
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
        }
    }
}

/// Result of listing the default branch tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeListing {
    Entries {
        entries: Vec<TreeEntry>,
        /// The service cut the listing short
        truncated: bool,
    },
    /// No commit history yet
    EmptyRepository,
}

impl TreeListing {
    pub fn complete(entries: Vec<TreeEntry>) -> Self {
        TreeListing::Entries {
            entries,
            truncated: false,
        }
    }

    /// Paths of file entries, in listing order
    pub fn blob_paths(&self) -> Vec<&str> {
        match self {
            TreeListing::Entries { entries, .. } => entries
                .iter()
                .filter(|e| e.kind == EntryKind::Blob)
                .map(|e| e.path.as_str())
                .collect(),
            TreeListing::EmptyRepository => Vec::new(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, TreeListing::Entries { truncated: true, .. })
    }
}

/// Result of fetching one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Found(Vec<u8>),
    NotFound,
}

/// Read access to a hosted repository's default branch tip
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Raw bytes of `path`, or `NotFound` if no such blob exists
    async fn fetch_file(&self, repo: &Repository, path: &str) -> Result<FileContent>;

    /// Full recursive listing of the default branch tip
    async fn fetch_tree(&self, repo: &Repository) -> Result<TreeListing>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_name() {
        let (owner, name) = Repository::parse_full_name("octo/hello-world").unwrap();
        assert_eq!(owner, "octo");
        assert_eq!(name, "hello-world");

        let (_, name) = Repository::parse_full_name("octo/site.git").unwrap();
        assert_eq!(name, "site");
    }

    #[test]
    fn test_parse_full_name_invalid() {
        assert!(Repository::parse_full_name("no-slash").is_err());
        assert!(Repository::parse_full_name("/repo").is_err());
        assert!(Repository::parse_full_name("owner/").is_err());
        assert!(Repository::parse_full_name("a/b/c").is_err());
    }

    #[test]
    fn test_blob_paths_skip_trees_and_submodules() {
        let listing = TreeListing::complete(vec![
            TreeEntry::tree("docs"),
            TreeEntry::blob("docs/intro.md"),
            TreeEntry {
                path: "vendor/lib".to_string(),
                kind: EntryKind::Commit,
            },
            TreeEntry::blob("README.md"),
        ]);

        assert_eq!(listing.blob_paths(), vec!["docs/intro.md", "README.md"]);
        assert!(!listing.is_truncated());
    }

    #[test]
    fn test_empty_repository_has_no_blobs() {
        assert!(TreeListing::EmptyRepository.blob_paths().is_empty());
    }

    #[test]
    fn test_tree_entry_deserialization() {
        let json = r#"[
            {"path": "src", "mode": "040000", "type": "tree", "sha": "abc"},
            {"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "def", "size": 12},
            {"path": "odd", "type": "symlink"}
        ]"#;
        let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Tree);
        assert_eq!(entries[1], TreeEntry::blob("src/main.rs"));
        assert_eq!(entries[2].kind, EntryKind::Other);
    }

    #[test]
    fn test_repository_display() {
        let repo = Repository::new("octo", "hello").private(true);
        assert_eq!(repo.to_string(), "octo/hello");
        assert_eq!(repo.full_name(), "octo/hello");
        assert!(repo.private);
    }
}
