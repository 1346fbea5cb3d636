//! # Configuration
//!
//! `repo-fleet` is configured in three layers, later layers winning:
//!
//! 1. built-in defaults (see [`crate::defaults`]),
//! 2. an optional YAML file (`.repo-fleet.yaml` in the current directory, or
//!    the path given with `--config`),
//! 3. command-line flags and their environment variables (`GITHUB_TOKEN`,
//!    `REPO_FLEET_ORGS`, `REPO_FLEET_DIR`, `REPO_FLEET_API_URL`).
//!
//! ## Example file
//!
//! ```yaml
//! organizations: [acme, acme-labs]
//! directory: ~/src
//! shallow: false
//! allowed_licenses: [MIT, Apache-2.0]
//! branch_prefix: repo-fleet
//! jobs: 4
//! ```
//!
//! The token is normally taken from the environment rather than the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::defaults;
use crate::error::{Error, Result};
use crate::github::ClientOptions;
use crate::license::AllowedLicenses;

const KNOWN_FIELDS: &[&str] = &[
    "organizations",
    "token",
    "api_url",
    "directory",
    "shallow",
    "allowed_licenses",
    "branch_prefix",
    "timeout_secs",
    "retries",
    "jobs",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    pub organizations: Vec<String>,
    pub token: Option<String>,
    pub api_url: String,
    /// Root for local clones; `None` means [`defaults::default_clone_root`].
    pub directory: Option<PathBuf>,
    pub shallow: bool,
    pub allowed_licenses: AllowedLicenses,
    pub branch_prefix: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub jobs: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            organizations: Vec::new(),
            token: None,
            api_url: defaults::API_URL.to_string(),
            directory: None,
            shallow: false,
            allowed_licenses: AllowedLicenses::All,
            branch_prefix: defaults::BRANCH_PREFIX.to_string(),
            timeout_secs: defaults::TIMEOUT_SECS,
            retries: defaults::RETRIES,
            jobs: 1,
        }
    }
}

/// Values supplied on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub organizations: Vec<String>,
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub directory: Option<PathBuf>,
    pub shallow: Option<bool>,
    pub allowed_licenses: Option<AllowedLicenses>,
    pub jobs: Option<usize>,
}

/// Parses configuration YAML. An empty document yields the defaults.
pub fn parse(yaml_content: &str) -> Result<FleetConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(FleetConfig::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        let hint = message
            .contains("unknown field")
            .then(|| format!("known fields are: {}", KNOWN_FIELDS.join(", ")));
        Error::ConfigParse { message, hint }
    })
}

pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FleetConfig> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(Error::Io)?;
    parse(&content)
}

/// Loads `explicit`, which must exist, or else the default file in the
/// current directory if there is one.
pub fn load(explicit: Option<&Path>) -> Result<FleetConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigParse {
                    message: format!("configuration file not found: {}", path.display()),
                    hint: None,
                });
            }
            from_file(path)
        }
        None => {
            let default = Path::new(defaults::CONFIG_FILE);
            if default.is_file() {
                log::debug!("Using configuration from {}", default.display());
                from_file(default)
            } else {
                Ok(FleetConfig::default())
            }
        }
    }
}

impl FleetConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.organizations.is_empty() {
            self.organizations = overrides.organizations;
        }
        if overrides.token.is_some() {
            self.token = overrides.token;
        }
        if let Some(api_url) = overrides.api_url {
            self.api_url = api_url;
        }
        if overrides.directory.is_some() {
            self.directory = overrides.directory;
        }
        if let Some(shallow) = overrides.shallow {
            self.shallow = shallow;
        }
        if let Some(allowed) = overrides.allowed_licenses {
            self.allowed_licenses = allowed;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
    }

    /// The API token, or [`Error::MissingCredential`] if none was supplied.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::MissingCredential {
                message: "no API token; set GITHUB_TOKEN or pass --token".to_string(),
            }),
        }
    }

    pub fn require_organizations(&self) -> Result<&[String]> {
        if self.organizations.is_empty() {
            return Err(Error::ConfigParse {
                message: "no organizations configured".to_string(),
                hint: Some("pass --org, set REPO_FLEET_ORGS, or add `organizations` to the config file".to_string()),
            });
        }
        Ok(&self.organizations)
    }

    /// The API root, with a trailing slash so relative joins stay under it.
    pub fn api_base(&self) -> Result<Url> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    /// The local clone root. A leading `~` is the home directory.
    pub fn clone_root(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => expand_home(dir),
            None => defaults::default_clone_root(),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            ..ClientOptions::default()
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let rest = match path.strip_prefix("~") {
        Ok(rest) => rest,
        Err(_) => return path.to_path_buf(),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
