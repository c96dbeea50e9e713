//! One repository run
//!
//! validate options → gate → resolve → materialize each path in order.
//!
//! Paths are materialized strictly one after another so the provenance log
//! follows resolution order. A missing file only skips that file; a transport
//! error ends the run for this repository and is returned to the driver.

use crate::config::FetchOptions;
use crate::gate::{self, SkipReason};
use crate::github::{Repository, RepositoryApi};
use crate::materializer::{materialize, MaterializeOutcome};
use crate::resolver::resolve;
use crate::Result;
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// The gate rejected the repository; nothing was fetched
    Skipped(SkipReason),
    Completed(RunSummary),
}

impl RunReport {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunReport::Completed(summary) => Some(summary),
            RunReport::Skipped(_) => None,
        }
    }
}

/// Per-path results of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Paths the source resolved to, in processing order
    pub resolved: Vec<String>,
    /// Files written, in order
    pub written: Vec<PathBuf>,
    pub not_found: Vec<String>,
    pub rejected: Vec<String>,
    /// Writes whose provenance append failed
    pub log_failures: usize,
}

/// Fetch `options.source` from `repo` into `options.output`.
///
/// Missing `source` or `output` is a configuration error and nothing else
/// runs.
pub async fn run<A>(api: &A, repo: &Repository, options: &FetchOptions) -> Result<RunReport>
where
    A: RepositoryApi + ?Sized,
{
    let (source, output) = match (options.require_source(), options.require_output()) {
        (Ok(source), Ok(output)) => (source, output),
        (Err(e), _) | (_, Err(e)) => {
            error!(repo = %repo, "{}", e);
            return Err(e);
        }
    };

    if let Some(reason) = gate::check(repo, options) {
        warn!(repo = %repo, reason = %reason, "IGNORE {}", reason);
        return Ok(RunReport::Skipped(reason));
    }

    let resolved = resolve(source, api, repo).await?;

    if resolved.is_empty() {
        warn!(repo = %repo, source = %source, "No matches found for {}.", source);
    } else if resolved.len() > 1 {
        debug!(repo = %repo, count = resolved.len(), "Start downloading {} files", resolved.len());
    }

    let mut summary = RunSummary::default();

    for path in resolved.iter() {
        match materialize(api, repo, output, path).await? {
            MaterializeOutcome::Written { target, logged, .. } => {
                if !logged {
                    summary.log_failures += 1;
                }
                summary.written.push(target);
            }
            MaterializeOutcome::NotFound => summary.not_found.push(path.to_string()),
            MaterializeOutcome::Rejected => summary.rejected.push(path.to_string()),
        }
    }

    summary.resolved = resolved.into_iter().collect();
    Ok(RunReport::Completed(summary))
}
