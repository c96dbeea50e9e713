//! GitHub REST API client
//!
//! Implements [`RepositoryApi`] plus the repository lookups the CLI driver
//! needs (single repository, organization and user listings). Works against
//! github.com and GitHub Enterprise (`https://<host>/api/v3`).

use super::retry::{with_retry, RetryConfig};
use super::{FileContent, Repository, RepositoryApi, TreeEntry, TreeListing};
use crate::{RepoFetchError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type that makes the contents endpoint return the file body itself
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Recursive listings of large trees are slow to produce server-side
const TREE_TIMEOUT: Duration = Duration::from_secs(60);
const CONTENT_TIMEOUT: Duration = Duration::from_secs(30);
const METADATA_TIMEOUT: Duration = Duration::from_secs(15);

const PER_PAGE: usize = 100;

/// Seconds to wait when a rate-limit response carries no Retry-After
const DEFAULT_RATE_LIMIT_WAIT: u64 = 60;

/// Repository payload from the REST API
#[derive(Debug, Clone, Deserialize)]
struct GitHubRepo {
    name: String,
    owner: GitHubOwner,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubOwner {
    login: String,
}

impl From<GitHubRepo> for Repository {
    fn from(repo: GitHubRepo) -> Self {
        Repository {
            owner: repo.owner.login,
            name: repo.name,
            archived: repo.archived,
            fork: repo.fork,
            private: repo.private,
            default_branch: repo.default_branch,
        }
    }
}

/// `GET /repos/{owner}/{repo}/git/trees/{ref}` payload
#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// GitHub API client
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a client for api.github.com.
    ///
    /// Falls back to the `GITHUB_TOKEN` environment variable when no token is
    /// given.
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("repofetch/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        let token = token
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()));

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            token,
            retry: RetryConfig::default(),
        })
    }

    /// Point the client at another host (GitHub Enterprise, or a test server)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = api_base_url(url);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, owner: &str, name: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(name)
        )
    }

    fn contents_url(&self, repo: &Repository, path: &str) -> String {
        format!(
            "{}/contents/{}",
            self.repo_url(&repo.owner, &repo.name),
            encode_path(path)
        )
    }

    fn tree_url(&self, repo: &Repository) -> String {
        format!(
            "{}/git/trees/HEAD?recursive=true",
            self.repo_url(&repo.owner, &repo.name)
        )
    }

    fn get(&self, url: &str, accept: &'static str, timeout: Duration) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, accept)
            .timeout(timeout);
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Look up one repository's metadata
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        let url = self.repo_url(owner, name);
        let url = url.as_str();

        debug!(owner = %owner, repo = %name, "Fetching repository metadata");

        let repo: GitHubRepo =
            with_retry(&self.retry, "get_repository", move || self.request_json(url)).await?;
        Ok(Repository::from(repo))
    }

    /// Look up each `owner/name` argument in order.
    ///
    /// Every argument gets its own result, so one bad name does not hide the
    /// others.
    pub async fn lookup_repositories(&self, full_names: &[String]) -> Vec<Result<Repository>> {
        let mut results = Vec::with_capacity(full_names.len());
        for full_name in full_names {
            let result = match Repository::parse_full_name(full_name) {
                Ok((owner, name)) => self.get_repository(&owner, &name).await,
                Err(e) => Err(e),
            };
            results.push(result);
        }
        results
    }

    /// All repositories of an organization
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<Repository>> {
        let prefix = format!("{}/orgs/{}/repos", self.base_url, urlencoding::encode(org));
        self.list_repos(&prefix).await
    }

    /// All public repositories of a user (plus private ones the token can see)
    pub async fn list_user_repos(&self, user: &str) -> Result<Vec<Repository>> {
        let prefix = format!("{}/users/{}/repos", self.base_url, urlencoding::encode(user));
        self.list_repos(&prefix).await
    }

    async fn list_repos(&self, prefix: &str) -> Result<Vec<Repository>> {
        let mut all_repos = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}?per_page={}&page={}", prefix, PER_PAGE, page);
            let url = url.as_str();

            let repos: Vec<GitHubRepo> =
                with_retry(&self.retry, "list_repos", move || self.request_json(url)).await?;

            let count = repos.len();
            all_repos.extend(repos.into_iter().map(Repository::from));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(count = all_repos.len(), "Listed repositories");
        Ok(all_repos)
    }

    async fn request_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url, JSON_MEDIA_TYPE, METADATA_TIMEOUT).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    async fn request_file(&self, url: &str) -> Result<FileContent> {
        let response = self.get(url, RAW_MEDIA_TYPE, CONTENT_TIMEOUT).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(FileContent::NotFound),
            status if status.is_success() => {
                Ok(FileContent::Found(response.bytes().await?.to_vec()))
            }
            _ => Err(error_from_response(response).await),
        }
    }

    async fn request_tree(&self, url: &str) -> Result<TreeListing> {
        let response = self.get(url, JSON_MEDIA_TYPE, TREE_TIMEOUT).send().await?;
        match response.status() {
            // 409: "Git Repository is empty"; 404: no HEAD to resolve
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => Ok(TreeListing::EmptyRepository),
            status if status.is_success() => {
                let body: TreeResponse = response.json().await?;
                Ok(TreeListing::Entries {
                    entries: body.tree,
                    truncated: body.truncated,
                })
            }
            _ => Err(error_from_response(response).await),
        }
    }
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn fetch_file(&self, repo: &Repository, path: &str) -> Result<FileContent> {
        let url = self.contents_url(repo, path);
        let url = url.as_str();
        with_retry(&self.retry, "fetch_file", move || self.request_file(url)).await
    }

    async fn fetch_tree(&self, repo: &Repository) -> Result<TreeListing> {
        let url = self.tree_url(repo);
        let url = url.as_str();
        with_retry(&self.retry, "fetch_tree", move || self.request_tree(url)).await
    }
}

/// Map a user-facing GitHub URL to its REST API root
fn api_base_url(url: &str) -> String {
    let base = url.trim().trim_end_matches('/');
    if base.contains("api.github.com") || base.ends_with("/api/v3") {
        base.to_string()
    } else if base.contains("://github.com") || base == "github.com" {
        DEFAULT_API_URL.to_string()
    } else if base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost") {
        base.to_string()
    } else {
        format!("{}/api/v3", base)
    }
}

/// Percent-encode each segment of a repository-relative path
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a non-success response into the matching error
async fn error_from_response(response: Response) -> RepoFetchError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    match status {
        StatusCode::UNAUTHORIZED => {
            RepoFetchError::Auth("GitHub authentication failed (check GITHUB_TOKEN)".to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            RepoFetchError::RateLimited(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT))
        }
        StatusCode::FORBIDDEN if retry_after.is_some() || quota_exhausted => {
            warn!(status = %status, "GitHub rate limit reached");
            RepoFetchError::RateLimited(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT))
        }
        _ => {
            let message = response.text().await.unwrap_or_default();
            RepoFetchError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        GitHubClient::new(Some("test-token".to_string())).expect("Failed to create client")
    }

    #[test]
    fn test_default_base_url() {
        let client = client();
        assert_eq!(client.base_url(), DEFAULT_API_URL);
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_enterprise_urls() {
        assert_eq!(
            api_base_url("https://github.example.com/"),
            "https://github.example.com/api/v3"
        );
        assert_eq!(
            api_base_url("https://github.example.com/api/v3"),
            "https://github.example.com/api/v3"
        );
        assert_eq!(api_base_url("https://github.com"), DEFAULT_API_URL);
        assert_eq!(api_base_url("https://api.github.com/"), DEFAULT_API_URL);
        assert_eq!(
            api_base_url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let client = client();
        let repo = Repository::new("octo", "hello");
        assert_eq!(
            client.contents_url(&repo, "docs/My File#1.md"),
            "https://api.github.com/repos/octo/hello/contents/docs/My%20File%231.md"
        );
        assert_eq!(
            client.contents_url(&repo, "/README.md"),
            "https://api.github.com/repos/octo/hello/contents/README.md"
        );
    }

    #[test]
    fn test_tree_url_is_recursive_head() {
        let client = client();
        let repo = Repository::new("octo", "hello");
        assert_eq!(
            client.tree_url(&repo),
            "https://api.github.com/repos/octo/hello/git/trees/HEAD?recursive=true"
        );
    }

    #[test]
    fn test_repo_payload_conversion() {
        let json = r#"{
            "id": 1,
            "name": "hello",
            "full_name": "octo/hello",
            "owner": {"login": "octo", "id": 7},
            "private": true,
            "fork": false,
            "archived": true,
            "default_branch": "main"
        }"#;
        let repo: Repository = serde_json::from_str::<GitHubRepo>(json).unwrap().into();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "hello");
        assert!(repo.private);
        assert!(repo.archived);
        assert!(!repo.fork);
        assert_eq!(repo.default_branch.as_deref(), Some("main"));
    }
}
