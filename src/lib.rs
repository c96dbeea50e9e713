//! repofetch - selectively download files from GitHub repositories
//!
//! Given a file path or glob (`README.md`, `docs/**/*.md`,
//! `{package.json,.github/workflows/*.yml}`), repofetch resolves the matching
//! files in a repository's default branch and writes them to
//! `<output>/<owner>/<repo>/<path>`, appending every written path to
//! `<output>/<owner>/list.csv`.
//!
//! # Architecture
//!
//! - **config**: per-run [`FetchOptions`] and the optional YAML config file
//! - **gate**: skip archived / forked / public / private repositories
//! - **resolver**: source specifier → unique list of repository paths
//! - **materializer**: fetch one path and write it, plus the provenance log
//! - **runner**: the per-repository pipeline tying the above together
//! - **github**: the [`RepositoryApi`] seam and its GitHub REST implementation
//!
//! # Example
//!
//! ```no_run
//! use repofetch::{run, FetchOptions, GitHubClient};
//!
//! # async fn example() -> repofetch::Result<()> {
//! let client = GitHubClient::new(None)?;
//! let repo = client.get_repository("rust-lang", "rust").await?;
//! let options = FetchOptions::new("{README.md,*.toml}").with_output("~/mirrors");
//! let report = run(&client, &repo, &options).await?;
//! println!("{:?}", report);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod github;
pub mod logging;
pub mod materializer;
pub mod resolver;
pub mod runner;

// Re-exports
pub use config::{FetchOptions, GitHubSettings, RepofetchConfig};
pub use error::{RepoFetchError, Result};
pub use gate::SkipReason;
pub use github::{FileContent, GitHubClient, Repository, RepositoryApi, TreeEntry, TreeListing};
pub use materializer::{materialize, MaterializeOutcome, ProvenanceLog};
pub use resolver::{resolve, ResolvedFileSet};
pub use runner::{run, RunReport, RunSummary};
