//! Repository pre-filter
//!
//! Decides, before anything is fetched, whether a repository is skipped
//! entirely. Flags are checked in a fixed order and the first match wins.

use crate::config::FetchOptions;
use crate::github::Repository;

/// Why a repository was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Archived,
    Fork,
    Public,
    Private,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Archived => write!(f, "repository is archived"),
            SkipReason::Fork => write!(f, "repository is a fork"),
            SkipReason::Public => write!(f, "repository is public"),
            SkipReason::Private => write!(f, "repository is private"),
        }
    }
}

/// The reason to skip `repo` under `options`, if any
pub fn check(repo: &Repository, options: &FetchOptions) -> Option<SkipReason> {
    if options.ignore_archived && repo.archived {
        Some(SkipReason::Archived)
    } else if options.ignore_forks && repo.fork {
        Some(SkipReason::Fork)
    } else if options.ignore_public && !repo.private {
        Some(SkipReason::Public)
    } else if options.ignore_private && repo.private {
        Some(SkipReason::Private)
    } else {
        None
    }
}
