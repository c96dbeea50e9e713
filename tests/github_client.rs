//! GitHubClient against a local stand-in for the GitHub REST API

use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use repofetch::github::retry::RetryConfig;
use repofetch::{FileContent, GitHubClient, RepoFetchError, Repository, RepositoryApi, TreeListing};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

const ORG_SIZE: usize = 150;

async fn repository(Path((owner, repo)): Path<(String, String)>) -> Response {
    match repo.as_str() {
        "missing" => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
        "secret" => (StatusCode::UNAUTHORIZED, "Bad credentials").into_response(),
        "busy" => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "7")],
            "slow down",
        )
            .into_response(),
        _ => Json(json!({
            "name": repo,
            "owner": {"login": owner},
            "archived": repo == "old",
            "fork": false,
            "private": true,
            "default_branch": "main",
        }))
        .into_response(),
    }
}

async fn contents(
    Path((_owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let raw = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "application/vnd.github.v3.raw")
        .unwrap_or(false);
    if !raw {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    match (repo.as_str(), path.as_str()) {
        ("flaky", _) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        (_, "README.md") => "# hello\n".into_response(),
        (_, "docs/my notes.md") => "notes".into_response(),
        (_, "logo.bin") => vec![0u8, 159, 146, 150, 255].into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
    }
}

async fn tree(
    Path((_owner, repo, reference)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if reference != "HEAD" || query.get("recursive").map(String::as_str) != Some("true") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match repo.as_str() {
        "empty" => (
            StatusCode::CONFLICT,
            Json(json!({"message": "Git Repository is empty."})),
        )
            .into_response(),
        "huge" => Json(json!({
            "sha": "abc",
            "tree": [{"path": "a.md", "type": "blob", "mode": "100644"}],
            "truncated": true,
        }))
        .into_response(),
        _ => Json(json!({
            "sha": "abc",
            "tree": [
                {"path": "README.md", "type": "blob", "mode": "100644", "size": 8},
                {"path": "docs", "type": "tree", "mode": "040000"},
                {"path": "docs/my notes.md", "type": "blob", "mode": "100644"},
                {"path": "vendor/lib", "type": "commit", "mode": "160000"},
            ],
            "truncated": false,
        }))
        .into_response(),
    }
}

async fn org_repos(
    Path(org): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let per_page: usize = query.get("per_page").and_then(|v| v.parse().ok()).unwrap_or(30);
    let page: usize = query.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);

    let repos: Vec<_> = (0..ORG_SIZE)
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|i| json!({"name": format!("repo-{}", i), "owner": {"login": org}, "fork": i % 2 == 0}))
        .collect();
    Json(repos).into_response()
}

async fn start_server() -> String {
    let app = Router::new()
        .route("/repos/{owner}/{repo}", get(repository))
        .route("/repos/{owner}/{repo}/contents/{*path}", get(contents))
        .route("/repos/{owner}/{repo}/git/trees/{reference}", get(tree))
        .route("/orgs/{org}/repos", get(org_repos));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn client() -> GitHubClient {
    let url = start_server().await;
    GitHubClient::new(Some("test-token".to_string()))
        .unwrap()
        .with_base_url(&url)
        .with_retry(RetryConfig::disabled())
}

#[tokio::test]
async fn test_get_repository() {
    let client = client().await;

    let repo = client.get_repository("octo", "old").await.unwrap();
    assert_eq!(repo.full_name(), "octo/old");
    assert!(repo.archived);
    assert!(repo.private);
    assert_eq!(repo.default_branch.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_get_repository_errors() {
    let client = client().await;

    let err = client.get_repository("octo", "missing").await.unwrap_err();
    assert!(matches!(err, RepoFetchError::Api { status: 404, .. }));

    let err = client.get_repository("octo", "secret").await.unwrap_err();
    assert!(matches!(err, RepoFetchError::Auth(_)));

    let err = client.get_repository("octo", "busy").await.unwrap_err();
    assert!(matches!(err, RepoFetchError::RateLimited(7)));
}

#[tokio::test]
async fn test_lookup_repositories_reports_each_name() {
    let client = client().await;
    let names = vec![
        "octo/missing".to_string(),
        "octo/hello".to_string(),
        "not-a-repo".to_string(),
        "octo/old".to_string(),
    ];

    let results = client.lookup_repositories(&names).await;

    assert_eq!(results.len(), 4);
    assert!(matches!(results[0], Err(RepoFetchError::Api { status: 404, .. })));
    assert_eq!(results[1].as_ref().unwrap().full_name(), "octo/hello");
    assert!(matches!(results[2], Err(RepoFetchError::Config(_))));
    assert!(results[3].as_ref().unwrap().archived);
}

#[tokio::test]
async fn test_fetch_file_returns_raw_bytes() {
    let client = client().await;
    let repo = Repository::new("octo", "hello");

    let content = client.fetch_file(&repo, "README.md").await.unwrap();
    assert_eq!(content, FileContent::Found(b"# hello\n".to_vec()));

    let content = client.fetch_file(&repo, "logo.bin").await.unwrap();
    assert_eq!(content, FileContent::Found(vec![0, 159, 146, 150, 255]));
}

#[tokio::test]
async fn test_fetch_file_encodes_path_segments() {
    let client = client().await;
    let repo = Repository::new("octo", "hello");

    let content = client.fetch_file(&repo, "docs/my notes.md").await.unwrap();
    assert_eq!(content, FileContent::Found(b"notes".to_vec()));
}

#[tokio::test]
async fn test_fetch_file_not_found_is_not_an_error() {
    let client = client().await;
    let repo = Repository::new("octo", "hello");

    let content = client.fetch_file(&repo, "nope.txt").await.unwrap();
    assert_eq!(content, FileContent::NotFound);
}

#[tokio::test]
async fn test_fetch_file_server_error() {
    let client = client().await;
    let repo = Repository::new("octo", "flaky");

    let err = client.fetch_file(&repo, "README.md").await.unwrap_err();
    assert!(matches!(err, RepoFetchError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_tree() {
    let client = client().await;
    let repo = Repository::new("octo", "hello");

    let listing = client.fetch_tree(&repo).await.unwrap();
    assert!(!listing.is_truncated());
    assert_eq!(listing.blob_paths(), vec!["README.md", "docs/my notes.md"]);
}

#[tokio::test]
async fn test_fetch_tree_empty_repository() {
    let client = client().await;
    let repo = Repository::new("octo", "empty");

    let listing = client.fetch_tree(&repo).await.unwrap();
    assert_eq!(listing, TreeListing::EmptyRepository);
    assert!(listing.blob_paths().is_empty());
}

#[tokio::test]
async fn test_fetch_tree_truncated() {
    let client = client().await;
    let repo = Repository::new("octo", "huge");

    let listing = client.fetch_tree(&repo).await.unwrap();
    assert!(listing.is_truncated());
    assert_eq!(listing.blob_paths(), vec!["a.md"]);
}

#[tokio::test]
async fn test_list_org_repos_follows_pages() {
    let client = client().await;

    let repos = client.list_org_repos("octo").await.unwrap();
    assert_eq!(repos.len(), ORG_SIZE);
    assert_eq!(repos[0].full_name(), "octo/repo-0");
    assert_eq!(repos[ORG_SIZE - 1].name, format!("repo-{}", ORG_SIZE - 1));
    assert!(repos[0].fork);
    assert!(!repos[1].fork);
}

#[tokio::test]
async fn test_resolve_and_materialize_over_http() {
    let client = client().await;
    let temp_dir = tempfile::TempDir::new().unwrap();
    let repo = Repository::new("octo", "hello");
    let options = repofetch::FetchOptions::new("{docs/*.md,README.md,CHANGELOG.md}")
        .with_output(temp_dir.path());

    let report = repofetch::run(&client, &repo, &options).await.unwrap();
    let summary = report.summary().unwrap();

    assert_eq!(summary.written.len(), 2);
    assert_eq!(summary.not_found, vec!["CHANGELOG.md"]);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("octo/hello/docs/my notes.md")).unwrap(),
        "notes"
    );
}
