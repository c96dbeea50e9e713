//! Configuration system
//!
//! - [`FetchOptions`]: the per-run options (source, output, skip flags)
//! - [`RepofetchConfig`]: the optional YAML file supplying defaults for those
//!   options and the GitHub endpoint

mod fetch_options;
mod repofetch_config;

pub use fetch_options::FetchOptions;
pub use repofetch_config::{GitHubSettings, RepofetchConfig};
