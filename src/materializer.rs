//! Writing fetched files into the destination tree
//!
//! Layout under the destination root:
//! ```text
//! <root>/
//!   <owner>/
//!     list.csv            # provenance log, one written path per line
//!     <repo>/
//!       <repo-relative path>
//! ```
//!
//! Existing files are overwritten (last write wins). The provenance log is
//! append-only and shared by every repository of the same owner; nothing
//! deduplicates it, so re-running appends the same paths again.

use crate::github::{FileContent, Repository, RepositoryApi};
use crate::Result;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// File name of the per-owner provenance log
pub const PROVENANCE_LOG_NAME: &str = "list.csv";

/// What happened to one resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Content written to `target`. `logged` is false when the provenance
    /// append failed.
    Written {
        target: PathBuf,
        bytes: usize,
        logged: bool,
    },
    /// The remote has no such file
    NotFound,
    /// The path would escape the repository directory
    Rejected,
}

/// Append-only record of written files for one owner
#[derive(Debug, Clone)]
pub struct ProvenanceLog {
    path: PathBuf,
}

impl ProvenanceLog {
    /// `<root>/<owner>/list.csv`
    pub fn for_owner(root: &Path, owner: &str) -> Self {
        Self {
            path: root.join(owner).join(PROVENANCE_LOG_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `target` as one line, creating the log if needed
    pub fn append(&self, target: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", target.display())
    }

    /// Lines currently in the log (empty if it does not exist yet)
    pub fn entries(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Replace a leading `~` with the current user's home directory.
///
/// Only `~` on its own or followed by a separator is expanded; `~user`
/// forms are left alone.
pub fn expand_home(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };

    let rest = if raw == "~" {
        ""
    } else if let Some(rest) = raw.strip_prefix("~/") {
        rest
    } else if let Some(rest) = raw.strip_prefix("~\\").filter(|_| cfg!(windows)) {
        rest
    } else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => {
            warn!(path = %raw, "Cannot expand ~: home directory unknown");
            path.to_path_buf()
        }
    }
}

/// `<root>/<owner>/<repo>/<path>`, or `None` if `path` is empty or climbs
/// out with `..`
pub fn target_path(root: &Path, repo: &Repository, path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        return None;
    }

    Some(root.join(&repo.owner).join(&repo.name).join(relative))
}

/// Fetch `path` from `repo` and write it under `destination_root`.
///
/// A missing remote file is logged and reported as [`MaterializeOutcome::NotFound`].
/// Transport and filesystem errors are returned. A failure to append to the
/// provenance log is logged and never fails the call.
pub async fn materialize<A>(
    api: &A,
    repo: &Repository,
    destination_root: &Path,
    path: &str,
) -> Result<MaterializeOutcome>
where
    A: RepositoryApi + ?Sized,
{
    let filepath = format!("{}/{}", repo.full_name(), path);
    let root = expand_home(destination_root);

    let Some(target) = target_path(&root, repo, path) else {
        warn!(file = %filepath, "Refusing to write path outside the repository directory");
        return Ok(MaterializeOutcome::Rejected);
    };

    let content = match api.fetch_file(repo, path).await? {
        FileContent::Found(content) => content,
        FileContent::NotFound => {
            warn!(file = %filepath, "File {} not found", filepath);
            return Ok(MaterializeOutcome::NotFound);
        }
    };

    info!(file = %filepath, bytes = content.len(), "Download {}", filepath);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &content)?;

    let log = ProvenanceLog::for_owner(&root, &repo.owner);
    let logged = match log.append(&target) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                target = %target.display(),
                log = %log.path().display(),
                error = %e,
                "Failed adding {} to log",
                target.display()
            );
            false
        }
    };

    Ok(MaterializeOutcome::Written {
        target,
        bytes: content.len(),
        logged,
    })
}
