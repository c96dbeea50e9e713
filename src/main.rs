//! repofetch - download files from GitHub repositories by path or glob
//!
//! Main entry point for the repofetch CLI. Repositories are processed one at
//! a time; a failure in one repository is reported and the next one still
//! runs.

use clap::Parser;
use repofetch::{
    run, FetchOptions, GitHubClient, RepoFetchError, RepofetchConfig, Repository, RunReport,
};
use std::path::PathBuf;
use std::process;

/// repofetch - Download files from GitHub repositories by path or glob
#[derive(Parser, Debug)]
#[command(name = "repofetch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Repositories to fetch from (OWNER/REPO)
    repos: Vec<String>,

    /// File path or glob to download (e.g. README.md, "docs/**/*.md", "{a.md,b.md}")
    #[arg(short, long)]
    source: Option<String>,

    /// Destination directory (default: current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fetch from every repository of an organization
    #[arg(long, conflicts_with = "user")]
    org: Option<String>,

    /// Fetch from every repository of a user
    #[arg(long)]
    user: Option<String>,

    /// Do not skip archived repositories
    #[arg(long)]
    include_archived: bool,

    /// Skip forked repositories
    #[arg(long)]
    ignore_forks: bool,

    /// Skip public repositories
    #[arg(long, conflicts_with = "ignore_private")]
    ignore_public: bool,

    /// Skip private repositories
    #[arg(long)]
    ignore_private: bool,

    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub or GitHub Enterprise URL (default: https://api.github.com)
    #[arg(long)]
    api_url: Option<String>,

    /// Path to config file (default: ~/.config/repofetch/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command-line flags over the config file's defaults
    fn fetch_options(&self, base: FetchOptions) -> FetchOptions {
        let mut options = base;
        if let Some(ref source) = self.source {
            options.source = Some(source.clone());
        }
        if let Some(ref output) = self.output {
            options.output = Some(output.clone());
        }
        if self.include_archived {
            options.ignore_archived = false;
        }
        if self.ignore_forks {
            options.ignore_forks = true;
        }
        if self.ignore_public {
            options.ignore_public = true;
        }
        if self.ignore_private {
            options.ignore_private = true;
        }
        options
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = repofetch::logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run_cli(cli) {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("{} repositor{} failed", failed, if failed == 1 { "y" } else { "ies" });
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of repositories whose run failed
fn run_cli(cli: Cli) -> repofetch::Result<usize> {
    let config = RepofetchConfig::load_or_default(cli.config.as_deref())?;
    let options = cli.fetch_options(config.fetch.clone());
    options.validate()?;

    let token = cli.token.clone().or(config.github.token.clone());
    let api_url = cli.api_url.clone().unwrap_or(config.github.api_url.clone());
    let client = GitHubClient::new(token)?.with_base_url(&api_url);

    if !client.is_authenticated() {
        tracing::warn!("No GitHub token configured; private repositories are unavailable and rate limits are low");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(fetch_all(&client, &cli, &options))
}

async fn fetch_all(
    client: &GitHubClient,
    cli: &Cli,
    options: &FetchOptions,
) -> repofetch::Result<usize> {
    let mut repos = Vec::new();

    if let Some(ref org) = cli.org {
        repos.extend(client.list_org_repos(org).await?);
    }
    if let Some(ref user) = cli.user {
        repos.extend(client.list_user_repos(user).await?);
    }

    let lookups = client.lookup_repositories(&cli.repos).await;
    let (found, mut failed) = keep_found(&cli.repos, lookups);
    repos.extend(found);

    if repos.is_empty() && failed == 0 {
        return Err(RepoFetchError::Config(
            "No repositories given. Pass OWNER/REPO arguments, --org or --user".to_string(),
        ));
    }

    tracing::debug!(count = repos.len(), "Processing repositories");

    for repo in &repos {
        match run(client, repo, options).await {
            Ok(RunReport::Completed(summary)) => {
                tracing::debug!(
                    repo = %repo,
                    written = summary.written.len(),
                    not_found = summary.not_found.len(),
                    "Repository done"
                );
            }
            Ok(RunReport::Skipped(_)) => {}
            Err(e) => {
                tracing::error!(repo = %repo, error = %e, "Repository failed");
                failed += 1;
            }
        }
    }

    Ok(failed)
}

/// Split lookup results into the repositories found and a count of failures,
/// reporting each failure
fn keep_found(
    names: &[String],
    lookups: Vec<repofetch::Result<Repository>>,
) -> (Vec<Repository>, usize) {
    let mut found = Vec::new();
    let mut failed = 0;

    for (name, lookup) in names.iter().zip(lookups) {
        match lookup {
            Ok(repo) => found.push(repo),
            Err(e) => {
                tracing::error!(repo = %name, error = %e, "Repository lookup failed");
                failed += 1;
            }
        }
    }

    (found, failed)
}
