//! Default values for repo-fleet configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Hosting API root used when none is configured.
pub const API_URL: &str = "https://api.github.com/";

/// Prefix of the branches created for pushed files.
pub const BRANCH_PREFIX: &str = "repo-fleet";

/// Repository-relative path of the contributor identity map.
pub const MAILMAP_PATH: &str = ".mailmap";

pub const TIMEOUT_SECS: u64 = 30;

pub const RETRIES: u32 = 2;

/// Config file picked up from the current directory when `--config` is absent.
pub const CONFIG_FILE: &str = ".repo-fleet.yaml";

pub fn user_agent() -> String {
    format!("repo-fleet/{}", env!("CARGO_PKG_VERSION"))
}

/// Commit message, pull request title and body for a pushed file.
pub fn commit_message(path: &str) -> String {
    format!(
        "Adding/updating `{}`\n\nThis was uploaded via automation.",
        path
    )
}

/// Returns the default root for local clones.
///
/// `~/src` when the home directory is known, falling back to `src` in the
/// current directory.
///
/// This can be overridden by the `--directory` CLI flag or the
/// `REPO_FLEET_DIR` environment variable.
pub fn default_clone_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("src"))
        .unwrap_or_else(|| PathBuf::from("src"))
}
