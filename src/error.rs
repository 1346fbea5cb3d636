//! # Error Handling
//!
//! This module defines the centralized error type for `repo-fleet`. It uses
//! `thiserror` to build an `Error` enum covering every failure the engine can
//! surface, with enough context (repository, URL, command) to make a log line
//! useful on its own.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`MissingCredential`, `ConfigParse`) are fatal
//!   and raised before any remote call.
//! - **Remote errors** (`Api`, `Transport`, `Decode`) come from the hosting
//!   API. `Error::is_transient` decides whether the client may retry them.
//! - **Local errors** (`GitClone`, `GitCommand`, `Io`) come from the `git`
//!   binary or the filesystem.
//!
//! A missing file on the remote is *not* an error: content reads return
//! `Ok(None)` for that case, so `NotFound` is only used for resources whose
//! absence is unexpected (a default branch ref, an organization).

use thiserror::Error;

/// Main error type for repo-fleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// No access credential was supplied.
    #[error("Missing credential: {message}")]
    MissingCredential { message: String },

    /// The configuration file or a configuration value could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The hosting API answered with a non-success status.
    #[error("API error: {method} {url} returned {status}: {message}")]
    Api {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    /// The request never produced an HTTP response (DNS, TLS, reset, timeout).
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// A resource that must exist was not found.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// A response body could not be decoded.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url} into {path}: {message}")]
    GitClone {
        url: String,
        path: String,
        message: String,
    },

    /// A `git` command exited unsuccessfully.
    #[error("Git command failed in {path}: {command} - {stderr}")]
    GitCommand {
        command: String,
        path: String,
        stderr: String,
    },

    /// The run was cancelled before this repository was started.
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Returns `true` when retrying the same request may succeed.
    ///
    /// Transport failures, server errors and rate limiting are transient.
    /// Authentication, authorization, not-found and validation failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` for an API response with status 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Api { status: 404, .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            method: "GET".to_string(),
            url: "https://api.github.com/orgs/acme/repos".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_error_display_missing_credential() {
        let error = Error::MissingCredential {
            message: "set GITHUB_TOKEN".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Missing credential"));
        assert!(display.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "unknown field `orgz`".to_string(),
            hint: Some("did you mean `organizations`?".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("organizations"));
    }

    #[test]
    fn test_error_display_api() {
        let display = format!("{}", api(502));
        assert!(display.contains("GET"));
        assert!(display.contains("502"));
        assert!(display.contains("orgs/acme/repos"));
    }

    #[test]
    fn test_error_display_git_command() {
        let error = Error::GitCommand {
            command: "pull origin main".to_string(),
            path: "/tmp/acme/a".to_string(),
            stderr: "fatal: not a git repository".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Git command failed"));
        assert!(display.contains("pull origin main"));
        assert!(display.contains("not a git repository"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(500).is_transient());
        assert!(api(503).is_transient());
        assert!(api(429).is_transient());
        assert!(Error::Transport {
            url: "https://api.github.com".to_string(),
            message: "connection reset".to_string(),
        }
        .is_transient());

        assert!(!api(401).is_transient());
        assert!(!api(403).is_transient());
        assert!(!api(404).is_transient());
        assert!(!api(422).is_transient());
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn test_not_found_classification() {
        assert!(api(404).is_not_found());
        assert!(Error::NotFound {
            resource: "acme/a heads/main".to_string()
        }
        .is_not_found());
        assert!(!api(500).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Error = io.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(format!("{}", error).contains("gone"));
    }
}
