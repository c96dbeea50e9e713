//! Source specifier resolution
//!
//! Turns a `--source` value into the list of repository-relative paths to
//! download. A literal path resolves to itself. A glob is matched against the
//! recursive tree listing of the default branch tip.
//!
//! Independently of the glob, every literal piece of a comma/brace expression
//! is requested directly: the recursive listing is capped on very large trees
//! and unavailable on empty ones, so `{README.md,docs/*.md}` still fetches
//! `README.md` when the listing comes back short.
//!
//! Glob semantics:
//! - `*` and `?` match within one path segment, `**` spans segments
//! - `[abc]` character classes
//! - `{a,b}` alternation, nestable
//! - top-level `a,b` is alternation too
//! - dot-prefixed components only match a literal `.`

use crate::github::{Repository, RepositoryApi, TreeListing};
use crate::Result;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use tracing::{debug, warn};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Unique repository-relative paths, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl ResolvedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; empty strings and duplicates are ignored.
    /// Returns true if the path was new.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if path.is_empty() || self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }
}

impl<S: Into<String>> FromIterator<S> for ResolvedFileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ResolvedFileSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl IntoIterator for ResolvedFileSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Resolve `specifier` against `repo`'s default branch tip.
///
/// The tree listing is only requested for glob specifiers, and a non-glob
/// specifier resolves to itself alone. An empty repository yields no glob
/// matches; any other listing failure is returned.
pub async fn resolve<A>(specifier: &str, api: &A, repo: &Repository) -> Result<ResolvedFileSet>
where
    A: RepositoryApi + ?Sized,
{
    let mut resolved = ResolvedFileSet::new();

    if is_glob(specifier) {
        let listing = api.fetch_tree(repo).await?;
        match listing {
            TreeListing::EmptyRepository => {
                warn!(repo = %repo, "Git Repository is empty");
            }
            TreeListing::Entries { truncated: true, .. } => {
                warn!(
                    repo = %repo,
                    "Tree listing was truncated; glob matches may be incomplete"
                );
            }
            TreeListing::Entries { .. } => {}
        }

        let candidates = listing.blob_paths();
        for path in match_paths(specifier, &candidates) {
            resolved.insert(path);
        }
        debug!(repo = %repo, pattern = %specifier, matches = resolved.len(), "Glob expanded");

        for literal in literal_segments(specifier) {
            resolved.insert(literal);
        }
    } else {
        resolved.insert(specifier);
    }

    Ok(resolved)
}

/// Whether `specifier` uses any glob syntax
pub fn is_glob(specifier: &str) -> bool {
    if specifier.contains(['*', '?', ',']) {
        return true;
    }
    if let Some(open) = specifier.find('[') {
        if specifier[open + 1..].contains(']') {
            return true;
        }
    }
    find_brace_group(specifier).is_some()
}

/// The pieces of `specifier` between `,`, `{` and `}` that contain no `*`.
///
/// These are requested directly in addition to any glob matches.
pub fn literal_segments(specifier: &str) -> Vec<&str> {
    specifier
        .split([',', '{', '}'])
        .filter(|segment| !segment.is_empty() && !segment.contains('*'))
        .collect()
}

/// Keep the candidates that match `pattern`, preserving candidate order.
///
/// Alternatives that are not valid globs are reported and match nothing.
pub fn match_paths<'a, S>(pattern: &str, candidates: &'a [S]) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    let patterns: Vec<Pattern> = expand_alternatives(pattern)
        .iter()
        .filter_map(|alternative| match Pattern::new(alternative) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!(pattern = %alternative, error = %e, "Invalid glob pattern");
                None
            }
        })
        .collect();

    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .filter(|path| {
            patterns
                .iter()
                .any(|p| p.matches_with(path, MATCH_OPTIONS))
        })
        .collect()
}

/// Split top-level commas, then expand `{...}` groups in each alternative.
///
/// `{a,b}/*.md,c` becomes `a/*.md`, `b/*.md`, `c`. A group without a comma
/// (`{a}`) is kept literally.
pub fn expand_alternatives(pattern: &str) -> Vec<String> {
    split_top_level(pattern)
        .into_iter()
        .filter(|alternative| !alternative.is_empty())
        .flat_map(expand_braces)
        .collect()
}

fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_brace_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    split_top_level(body)
        .into_iter()
        .flat_map(|choice| expand_braces(&format!("{prefix}{choice}{suffix}")))
        .collect()
}

/// Byte offsets of the first `{` and its matching `}` whose body has a
/// top-level comma
fn find_brace_group(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut search_from = 0;

    while let Some(rel) = pattern[search_from..].find('{') {
        let open = search_from + rel;
        let mut depth = 0usize;
        let mut has_comma = false;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if has_comma {
                            return Some((open, i));
                        }
                        break;
                    }
                }
                b',' if depth == 1 => has_comma = true,
                _ => {}
            }
        }

        search_from = open + 1;
    }

    None
}

/// Split on commas that are not inside braces
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}
