//! Data model shared by every component: repository descriptors and the
//! small records exchanged with the hosting API.
//!
//! Field names follow the hosting API's JSON so the types deserialize
//! directly from responses.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// License information attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Short key, e.g. `mit`
    pub key: String,
    /// SPDX identifier, e.g. `MIT`. `NOASSERTION` when the host cannot tell.
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl License {
    /// The identifier used for allow-list checks: the SPDX id when known,
    /// otherwise the key.
    pub fn identifier(&self) -> &str {
        match self.spdx_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.key,
        }
    }
}

/// A remote repository descriptor.
///
/// Fetched fresh on every run and treated as immutable while an operation
/// runs against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `org/name`
    pub full_name: String,
    pub name: String,
    pub default_branch: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub license: Option<License>,
    pub clone_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Repository {
    /// Builds a descriptor with the given full name and defaults for the rest.
    ///
    /// Mostly useful when constructing fixtures.
    pub fn new(full_name: &str, default_branch: &str) -> Self {
        let name = full_name.rsplit('/').next().unwrap_or(full_name).to_string();
        Self {
            full_name: full_name.to_string(),
            name,
            default_branch: default_branch.to_string(),
            archived: false,
            fork: false,
            private: false,
            license: None,
            clone_url: format!("https://github.com/{}.git", full_name),
            topics: Vec::new(),
        }
    }

    /// The organization (owner) part of `full_name`.
    pub fn owner(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or("")
    }

    /// Maps this repository to its working-copy directory under `root`.
    ///
    /// `root/org/name` by default, `root/name` with the shallow layout.
    pub fn local_path(&self, root: &Path, shallow: bool) -> PathBuf {
        if shallow {
            root.join(&self.name)
        } else {
            root.join(self.owner()).join(&self.name)
        }
    }
}

/// A git reference and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

impl GitRef {
    pub fn sha(&self) -> &str {
        &self.object.sha
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

/// A file read from a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub path: String,
    /// Blob revision; required as the base when updating the file.
    pub sha: String,
    pub content: Vec<u8>,
}

impl ContentFile {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
}

/// Pull request state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PullRequestState {
    #[default]
    Open,
    Closed,
    All,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
            PullRequestState::All => "all",
        }
    }
}

/// Query for listing pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestQuery {
    pub state: PullRequestState,
    /// Restrict to pull requests targeting this base branch.
    pub base: Option<String>,
}
