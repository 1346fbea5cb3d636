//! The hosting API contract consumed by the engine.
//!
//! [`HostingApi`] is the seam between the batch logic and the HTTP
//! transport. [`crate::github::GitHubClient`] implements it for real; tests
//! implement it in memory.
//!
//! Ref naming is deliberately not normalized: reads take `heads/<branch>`,
//! creation takes `refs/heads/<branch>`, exactly as the remote expects.

use crate::error::Result;
use crate::models::{ContentFile, GitRef, PullRequest, PullRequestQuery, Repository};
use crate::pagination::{Page, Pages};

/// Operations the engine needs from the code-hosting service.
pub trait HostingApi: Send + Sync {
    /// One page of an organization's repositories. `cursor` is `None` for the
    /// first page.
    fn org_repositories_page(&self, org: &str, cursor: Option<&str>) -> Result<Page<Repository>>;

    /// Resolves a ref such as `heads/main`.
    fn get_ref(&self, repo: &str, reference: &str) -> Result<GitRef>;

    /// Reads a file. `Ok(None)` when the file does not exist.
    ///
    /// `branch` of `None` reads from the default branch.
    fn get_content(&self, repo: &str, path: &str, branch: Option<&str>)
        -> Result<Option<ContentFile>>;

    fn create_content(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<()>;

    /// Updates a file; `base_sha` is the revision the update is based on.
    fn update_content(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        base_sha: &str,
        branch: &str,
    ) -> Result<()>;

    /// Creates a ref such as `refs/heads/<name>` pointing at `sha`.
    fn create_ref(&self, repo: &str, reference: &str, sha: &str) -> Result<()>;

    fn create_pull_request(
        &self,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// One page of a repository's pull requests.
    fn pull_requests_page(
        &self,
        repo: &str,
        query: &PullRequestQuery,
        cursor: Option<&str>,
    ) -> Result<Page<PullRequest>>;
}

/// Lazily pages through an organization's repositories.
pub fn org_repositories<'a>(
    api: &'a dyn HostingApi,
    org: &'a str,
) -> Pages<Repository, impl FnMut(Option<&str>) -> Result<Page<Repository>> + 'a> {
    Pages::new(move |cursor| api.org_repositories_page(org, cursor))
}

/// Lazily pages through a repository's pull requests.
pub fn pull_requests<'a>(
    api: &'a dyn HostingApi,
    repo: &'a str,
    query: &'a PullRequestQuery,
) -> Pages<PullRequest, impl FnMut(Option<&str>) -> Result<Page<PullRequest>> + 'a> {
    Pages::new(move |cursor| api.pull_requests_page(repo, query, cursor))
}
