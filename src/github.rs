//! # GitHub REST Client
//!
//! [`GitHubClient`] implements [`HostingApi`] on top of a blocking `ureq`
//! agent. It owns the transport concerns the engine does not care about:
//!
//! - bearer authentication and the versioned `Accept` header,
//! - URL construction with per-segment percent-encoding,
//! - `Link: <...>; rel="next"` pagination (the cursor is the next page URL),
//! - base64 content encoding,
//! - a request timeout and a small bounded retry of reads on transient
//!   failures (transport errors, 5xx, 429). Writes are sent once, since a
//!   write that landed before the failure would conflict on replay.
//!   Authentication and not-found responses are returned immediately.

use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::defaults;
use crate::error::{Error, Result};
use crate::hosting::HostingApi;
use crate::logging::Logger;
use crate::models::{ContentFile, GitRef, PullRequest, PullRequestQuery, Repository};
use crate::pagination::Page;

const PER_PAGE: &str = "100";

/// Transport tuning for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Additional attempts after the first one, for transient failures only.
    pub retries: u32,
    /// Base delay between attempts; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            retries: defaults::RETRIES,
            backoff: Duration::from_millis(500),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Blocking client for the GitHub REST API.
pub struct GitHubClient {
    agent: ureq::Agent,
    base: Url,
    token: String,
    options: ClientOptions,
    logger: Logger,
}

#[derive(Deserialize)]
struct ContentResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubClient {
    pub fn new(base: Url, token: impl Into<String>, options: ClientOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(options.timeout)
            .user_agent(&options.user_agent)
            .build();
        Self {
            agent,
            base,
            token: token.into(),
            options,
            logger: Logger::facade(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Builds `base/<segments...>`, splitting each segment on `/` and
    /// percent-encoding the pieces.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| Error::ConfigParse {
                message: format!("API URL cannot be used as a base: {}", self.base),
                hint: Some("use an absolute http(s) URL such as https://api.github.com/".into()),
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    fn repo_endpoint(&self, repo: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["repos", repo];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    /// Sends one request. Only `GET` is retried on transient failures.
    fn send(&self, method: &str, url: &Url, body: Option<&Value>) -> Result<ureq::Response> {
        let mut attempt = 0;
        loop {
            let request = self
                .agent
                .request(method, url.as_str())
                .set("Authorization", &format!("Bearer {}", self.token))
                .set("Accept", "application/vnd.github+json")
                .set("X-GitHub-Api-Version", "2022-11-28");
            let result = match body {
                Some(body) => request.send_json(body),
                None => request.call(),
            };
            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => map_error(method, url, e),
            };
            if method == "GET" && error.is_transient() && attempt < self.options.retries {
                attempt += 1;
                self.logger.debug(format_args!(
                    "{} {} failed ({}), retry {}/{}",
                    method, url, error, attempt, self.options.retries
                ));
                thread::sleep(self.options.backoff * attempt);
                continue;
            }
            return Err(error);
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<(T, Option<String>)> {
        self.logger.debug(format_args!("GET {}", url));
        let response = self.send("GET", url, None)?;
        let next = response.header("Link").and_then(next_link);
        let value = response.into_json::<T>().map_err(|e| Error::Decode {
            message: format!("{}: {}", url, e),
        })?;
        Ok((value, next))
    }

    fn cursor_or(&self, cursor: Option<&str>, first: impl FnOnce() -> Result<Url>) -> Result<Url> {
        match cursor {
            Some(next) => Ok(Url::parse(next)?),
            None => first(),
        }
    }

    fn put_content(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
        base_sha: Option<&str>,
    ) -> Result<()> {
        let url = self.repo_endpoint(repo, &["contents", path])?;
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": branch,
        });
        if let Some(sha) = base_sha {
            body["sha"] = Value::String(sha.to_string());
        }
        self.logger.debug(format_args!("PUT {}", url));
        self.send("PUT", &url, Some(&body))?;
        Ok(())
    }
}

impl HostingApi for GitHubClient {
    fn org_repositories_page(&self, org: &str, cursor: Option<&str>) -> Result<Page<Repository>> {
        let url = self.cursor_or(cursor, || {
            let mut url = self.endpoint(&["orgs", org, "repos"])?;
            url.query_pairs_mut()
                .append_pair("per_page", PER_PAGE)
                .append_pair("type", "all");
            Ok(url)
        })?;
        let (items, next) = self.get_json::<Vec<Repository>>(&url)?;
        Ok(Page { items, next })
    }

    fn get_ref(&self, repo: &str, reference: &str) -> Result<GitRef> {
        let url = self.repo_endpoint(repo, &["git", "ref", reference])?;
        match self.get_json::<GitRef>(&url) {
            Ok((git_ref, _)) => Ok(git_ref),
            Err(e) if e.is_not_found() => Err(Error::NotFound {
                resource: format!("{} {}", repo, reference),
            }),
            Err(e) => Err(e),
        }
    }

    fn get_content(
        &self,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<Option<ContentFile>> {
        let mut url = self.repo_endpoint(repo, &["contents", path])?;
        if let Some(branch) = branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        let value = match self.get_json::<Value>(&url) {
            Ok((value, _)) => value,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        decode_content(value).map(Some)
    }

    fn create_content(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<()> {
        self.put_content(repo, path, message, content, branch, None)
    }

    fn update_content(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        base_sha: &str,
        branch: &str,
    ) -> Result<()> {
        self.put_content(repo, path, message, content, branch, Some(base_sha))
    }

    fn create_ref(&self, repo: &str, reference: &str, sha: &str) -> Result<()> {
        let url = self.repo_endpoint(repo, &["git", "refs"])?;
        self.logger.debug(format_args!("POST {} {}", url, reference));
        self.send("POST", &url, Some(&json!({ "ref": reference, "sha": sha })))?;
        Ok(())
    }

    fn create_pull_request(
        &self,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let url = self.repo_endpoint(repo, &["pulls"])?;
        self.logger.debug(format_args!("POST {}", url));
        let response = self.send(
            "POST",
            &url,
            Some(&json!({ "title": title, "head": head, "base": base, "body": body })),
        )?;
        response.into_json::<PullRequest>().map_err(|e| Error::Decode {
            message: format!("{}: {}", url, e),
        })
    }

    fn pull_requests_page(
        &self,
        repo: &str,
        query: &PullRequestQuery,
        cursor: Option<&str>,
    ) -> Result<Page<PullRequest>> {
        let url = self.cursor_or(cursor, || {
            let mut url = self.repo_endpoint(repo, &["pulls"])?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("state", query.state.as_str())
                    .append_pair("per_page", PER_PAGE);
                if let Some(base) = &query.base {
                    pairs.append_pair("base", base);
                }
            }
            Ok(url)
        })?;
        let (items, next) = self.get_json::<Vec<PullRequest>>(&url)?;
        Ok(Page { items, next })
    }
}

fn map_error(method: &str, url: &Url, error: ureq::Error) -> Error {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            Error::Api {
                status,
                method: method.to_string(),
                url: url.to_string(),
                message,
            }
        }
        ureq::Error::Transport(transport) => Error::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    static NEXT: OnceLock<Regex> = OnceLock::new();
    let re = NEXT.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("static regex is valid")
    });
    header
        .split(',')
        .find_map(|part| re.captures(part).map(|c| c[1].to_string()))
}

fn decode_content(value: Value) -> Result<ContentFile> {
    if value.is_array() {
        return Err(Error::Decode {
            message: "path is a directory, expected a file".to_string(),
        });
    }
    let response: ContentResponse = serde_json::from_value(value)?;
    let content = match response.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = response
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD.decode(compact).map_err(|e| Error::Decode {
                message: format!("{}: {}", response.path, e),
            })?
        }
        Some(other) => {
            return Err(Error::Decode {
                message: format!("{}: unsupported encoding {}", response.path, other),
            })
        }
    };
    Ok(ContentFile {
        path: response.path,
        sha: response.sha,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GitHubClient {
        GitHubClient::new(
            Url::parse(base).unwrap(),
            "t0k3n",
            ClientOptions {
                timeout: Duration::from_secs(5),
                retries: 2,
                backoff: Duration::ZERO,
                user_agent: "repo-fleet-tests".to_string(),
            },
        )
        .with_logger(Logger::null())
    }

    #[test]
    fn test_next_link_parsing() {
        let header = r#"<https://api.github.com/organizations/1/repos?page=2>; rel="next", <https://api.github.com/organizations/1/repos?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/organizations/1/repos?page=2")
        );
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/organizations/1/repos?page=1>; rel="prev", <https://api.github.com/organizations/1/repos?page=1>; rel="first""#;
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let c = client("https://api.github.com/");
        let url = c
            .repo_endpoint("acme/widgets", &["contents", ".github/workflows/ci file.yml"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/widgets/contents/.github/workflows/ci%20file.yml"
        );
    }

    #[test]
    fn test_endpoint_keeps_enterprise_prefix() {
        let c = client("https://ghe.example.com/api/v3/");
        let url = c.endpoint(&["orgs", "acme", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/orgs/acme/repos");
    }

    #[test]
    fn test_ref_read_path_uses_heads_prefix() {
        let c = client("https://api.github.com/");
        let url = c
            .repo_endpoint("acme/a", &["git", "ref", "heads/feature/x"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/a/git/ref/heads/feature/x"
        );
    }

    #[test]
    fn test_decode_content_with_line_breaks() {
        let encoded = STANDARD.encode("Jane <jane@acme.io>\n");
        let (a, b) = encoded.split_at(8);
        let value = json!({
            "path": ".mailmap",
            "sha": "blob1",
            "content": format!("{}\n{}\n", a, b),
            "encoding": "base64",
        });
        let file = decode_content(value).unwrap();
        assert_eq!(file.sha, "blob1");
        assert_eq!(file.text(), "Jane <jane@acme.io>\n");
    }

    #[test]
    fn test_decode_content_rejects_directory() {
        let result = decode_content(json!([{"path": "a"}]));
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_map_error_extracts_message() {
        let response =
            ureq::Response::new(404, "Not Found", r#"{"message":"Not Found"}"#).unwrap();
        let url = Url::parse("https://api.github.com/repos/acme/a").unwrap();
        let error = map_error("GET", &url, ureq::Error::Status(404, response));
        match error {
            Error::Api {
                status, message, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
