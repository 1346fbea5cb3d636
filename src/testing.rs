//! In-memory stand-ins for the hosting API and the local `git` binary.
//!
//! [`MockHost`] keeps organizations, refs, files and pull requests in memory,
//! records every call, and can be told to fail specific operations.
//! [`MockGit`] records calls and reports a configurable working-copy status.
//! Both are used by the crate's own tests and by its integration tests.
//! Outside the crate's unit tests the module needs the `testing` feature.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::git::WorkingCopyStatus;
use crate::hosting::HostingApi;
use crate::local_sync::GitOperations;
use crate::models::{ContentFile, GitObject, GitRef, PullRequest, PullRequestQuery, Repository};
use crate::pagination::Page;

/// One recorded hosting API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    ListRepos {
        org: String,
        cursor: Option<String>,
    },
    GetRef {
        repo: String,
        reference: String,
    },
    GetContent {
        repo: String,
        path: String,
        branch: Option<String>,
    },
    CreateContent {
        repo: String,
        path: String,
        branch: String,
    },
    UpdateContent {
        repo: String,
        path: String,
        branch: String,
        base_sha: String,
    },
    CreateRef {
        repo: String,
        reference: String,
        sha: String,
    },
    CreatePullRequest {
        repo: String,
        base: String,
        head: String,
        title: String,
    },
    ListPullRequests {
        repo: String,
        cursor: Option<String>,
    },
}

impl HostCall {
    pub fn repo(&self) -> Option<&str> {
        match self {
            HostCall::ListRepos { .. } => None,
            HostCall::GetRef { repo, .. }
            | HostCall::GetContent { repo, .. }
            | HostCall::CreateContent { repo, .. }
            | HostCall::UpdateContent { repo, .. }
            | HostCall::CreateRef { repo, .. }
            | HostCall::CreatePullRequest { repo, .. }
            | HostCall::ListPullRequests { repo, .. } => Some(repo),
        }
    }

    /// Whether the call changes remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            HostCall::CreateContent { .. }
                | HostCall::UpdateContent { .. }
                | HostCall::CreateRef { .. }
                | HostCall::CreatePullRequest { .. }
        )
    }
}

#[derive(Default)]
struct HostState {
    orgs: HashMap<String, Vec<Vec<Repository>>>,
    default_branches: HashMap<String, String>,
    /// (repo, "heads/<branch>") -> sha
    refs: HashMap<(String, String), String>,
    /// (repo, branch, path) -> file
    files: HashMap<(String, String, String), ContentFile>,
    pulls: HashMap<String, Vec<PullRequest>>,
    pull_page_size: usize,
    failures: HashSet<(String, String)>,
    next_id: u64,
    calls: Vec<HostCall>,
}

/// In-memory [`HostingApi`].
#[derive(Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

fn api_error(status: u16, method: &str, url: String, message: &str) -> Error {
    Error::Api {
        status,
        method: method.to_string(),
        url,
        message: message.to_string(),
    }
}

impl MockHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.lock().pull_page_size = 2;
        host
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers an organization whose listing is served as one page.
    pub fn with_org(self, org: &str, repos: Vec<Repository>) -> Self {
        self.with_org_pages(org, vec![repos])
    }

    /// Registers an organization whose listing is served as the given pages.
    pub fn with_org_pages(self, org: &str, pages: Vec<Vec<Repository>>) -> Self {
        {
            let mut state = self.lock();
            for repo in pages.iter().flatten() {
                state
                    .default_branches
                    .insert(repo.full_name.clone(), repo.default_branch.clone());
                state.refs.insert(
                    (repo.full_name.clone(), format!("heads/{}", repo.default_branch)),
                    format!("tip-{}", repo.full_name),
                );
            }
            state.orgs.insert(org.to_string(), pages);
        }
        self
    }

    /// Puts a file on the repository's default branch.
    pub fn with_file(self, repo: &str, path: &str, content: &str) -> Self {
        {
            let mut state = self.lock();
            let branch = state
                .default_branches
                .get(repo)
                .cloned()
                .unwrap_or_else(|| "main".to_string());
            state.next_id += 1;
            let file = ContentFile {
                path: path.to_string(),
                sha: format!("blob-{}", state.next_id),
                content: content.as_bytes().to_vec(),
            };
            state
                .files
                .insert((repo.to_string(), branch, path.to_string()), file);
        }
        self
    }

    pub fn with_pull_request(self, repo: &str, number: u64, title: &str) -> Self {
        self.lock()
            .pulls
            .entry(repo.to_string())
            .or_default()
            .push(pull_request(repo, number, title));
        self
    }

    pub fn with_pull_page_size(self, size: usize) -> Self {
        self.lock().pull_page_size = size.max(1);
        self
    }

    /// Makes `operation` fail for `target`.
    ///
    /// Operations: `list` (target `org`, or `org#<page>` for one page),
    /// `get_ref`, `get_content`, `create_content`, `update_content`,
    /// `create_ref`, `create_pull_request`, `list_pulls` (target `org/name`).
    pub fn failing(self, operation: &str, target: &str) -> Self {
        self.lock()
            .failures
            .insert((operation.to_string(), target.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    /// Mutating calls made against `repo`.
    pub fn mutations(&self, repo: &str) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.is_mutation() && c.repo() == Some(repo))
            .collect()
    }

    pub fn file(&self, repo: &str, branch: &str, path: &str) -> Option<ContentFile> {
        self.lock()
            .files
            .get(&(repo.to_string(), branch.to_string(), path.to_string()))
            .cloned()
    }

    pub fn pull_requests(&self, repo: &str) -> Vec<PullRequest> {
        self.lock().pulls.get(repo).cloned().unwrap_or_default()
    }

    fn check(state: &HostState, operation: &str, target: &str) -> Result<()> {
        if state
            .failures
            .contains(&(operation.to_string(), target.to_string()))
        {
            return Err(api_error(
                500,
                "POST",
                format!("mock://{}/{}", operation, target),
                "injected failure",
            ));
        }
        Ok(())
    }

    fn default_branch(state: &HostState, repo: &str) -> String {
        state
            .default_branches
            .get(repo)
            .cloned()
            .unwrap_or_else(|| "main".to_string())
    }
}

fn pull_request(repo: &str, number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        html_url: format!("https://github.com/{}/pull/{}", repo, number),
        state: "open".to_string(),
        user: None,
    }
}

fn page_index(cursor: Option<&str>) -> usize {
    cursor.and_then(|c| c.parse().ok()).unwrap_or(0)
}

impl HostingApi for MockHost {
    fn org_repositories_page(&self, org: &str, cursor: Option<&str>) -> Result<Page<Repository>> {
        let mut state = self.lock();
        state.calls.push(HostCall::ListRepos {
            org: org.to_string(),
            cursor: cursor.map(str::to_string),
        });
        let index = page_index(cursor);
        Self::check(&state, "list", org)?;
        Self::check(&state, "list", &format!("{}#{}", org, index))?;
        let pages = state.orgs.get(org).ok_or_else(|| {
            api_error(404, "GET", format!("mock://orgs/{}/repos", org), "Not Found")
        })?;
        let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(Page {
            items: pages.get(index).cloned().unwrap_or_default(),
            next,
        })
    }

    fn get_ref(&self, repo: &str, reference: &str) -> Result<GitRef> {
        let mut state = self.lock();
        state.calls.push(HostCall::GetRef {
            repo: repo.to_string(),
            reference: reference.to_string(),
        });
        Self::check(&state, "get_ref", repo)?;
        state
            .refs
            .get(&(repo.to_string(), reference.to_string()))
            .map(|sha| GitRef {
                name: format!("refs/{}", reference),
                object: GitObject { sha: sha.clone() },
            })
            .ok_or_else(|| Error::NotFound {
                resource: format!("{} {}", repo, reference),
            })
    }

    fn get_content(
        &self,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<Option<ContentFile>> {
        let mut state = self.lock();
        state.calls.push(HostCall::GetContent {
            repo: repo.to_string(),
            path: path.to_string(),
            branch: branch.map(str::to_string),
        });
        Self::check(&state, "get_content", repo)?;
        let branch = branch
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_branch(&state, repo));
        Ok(state
            .files
            .get(&(repo.to_string(), branch, path.to_string()))
            .cloned())
    }

    fn create_content(
        &self,
        repo: &str,
        path: &str,
        _message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(HostCall::CreateContent {
            repo: repo.to_string(),
            path: path.to_string(),
            branch: branch.to_string(),
        });
        Self::check(&state, "create_content", repo)?;
        let key = (repo.to_string(), branch.to_string(), path.to_string());
        if state.files.contains_key(&key) {
            return Err(api_error(
                422,
                "PUT",
                format!("mock://{}/contents/{}", repo, path),
                "\"sha\" wasn't supplied.",
            ));
        }
        state.next_id += 1;
        let sha = format!("blob-{}", state.next_id);
        state.files.insert(
            key,
            ContentFile {
                path: path.to_string(),
                sha,
                content: content.to_vec(),
            },
        );
        Ok(())
    }

    fn update_content(
        &self,
        repo: &str,
        path: &str,
        _message: &str,
        content: &[u8],
        base_sha: &str,
        branch: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(HostCall::UpdateContent {
            repo: repo.to_string(),
            path: path.to_string(),
            branch: branch.to_string(),
            base_sha: base_sha.to_string(),
        });
        Self::check(&state, "update_content", repo)?;
        let key = (repo.to_string(), branch.to_string(), path.to_string());
        match state.files.get(&key) {
            Some(existing) if existing.sha == base_sha => {}
            _ => {
                return Err(api_error(
                    409,
                    "PUT",
                    format!("mock://{}/contents/{}", repo, path),
                    "does not match",
                ))
            }
        }
        state.next_id += 1;
        let sha = format!("blob-{}", state.next_id);
        state.files.insert(
            key,
            ContentFile {
                path: path.to_string(),
                sha,
                content: content.to_vec(),
            },
        );
        Ok(())
    }

    fn create_ref(&self, repo: &str, reference: &str, sha: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(HostCall::CreateRef {
            repo: repo.to_string(),
            reference: reference.to_string(),
            sha: sha.to_string(),
        });
        Self::check(&state, "create_ref", repo)?;
        let short = reference.strip_prefix("refs/").unwrap_or(reference).to_string();
        if state.refs.contains_key(&(repo.to_string(), short.clone())) {
            return Err(api_error(
                422,
                "POST",
                format!("mock://{}/git/refs", repo),
                "Reference already exists",
            ));
        }
        state.refs.insert((repo.to_string(), short.clone()), sha.to_string());

        // The new branch starts with the default branch's files.
        let branch = short.strip_prefix("heads/").unwrap_or(&short).to_string();
        let default_branch = Self::default_branch(&state, repo);
        let copied: Vec<_> = state
            .files
            .iter()
            .filter(|((r, b, _), _)| r == repo && *b == default_branch)
            .map(|((r, _, p), f)| ((r.clone(), branch.clone(), p.clone()), f.clone()))
            .collect();
        state.files.extend(copied);
        Ok(())
    }

    fn create_pull_request(
        &self,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        let mut state = self.lock();
        state.calls.push(HostCall::CreatePullRequest {
            repo: repo.to_string(),
            base: base.to_string(),
            head: head.to_string(),
            title: title.to_string(),
        });
        Self::check(&state, "create_pull_request", repo)?;
        let number = state.pulls.get(repo).map(|p| p.len() as u64).unwrap_or(0) + 1;
        let pr = pull_request(repo, number, title);
        state
            .pulls
            .entry(repo.to_string())
            .or_default()
            .push(pr.clone());
        Ok(pr)
    }

    fn pull_requests_page(
        &self,
        repo: &str,
        _query: &PullRequestQuery,
        cursor: Option<&str>,
    ) -> Result<Page<PullRequest>> {
        let mut state = self.lock();
        state.calls.push(HostCall::ListPullRequests {
            repo: repo.to_string(),
            cursor: cursor.map(str::to_string),
        });
        Self::check(&state, "list_pulls", repo)?;
        let all = state.pulls.get(repo).cloned().unwrap_or_default();
        let size = state.pull_page_size.max(1);
        let index = page_index(cursor);
        let items: Vec<PullRequest> = all.iter().skip(index * size).take(size).cloned().collect();
        let next = ((index + 1) * size < all.len()).then(|| (index + 1).to_string());
        Ok(Page { items, next })
    }
}

/// One recorded git call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Clone { url: String, path: PathBuf },
    Status(PathBuf),
    Clean {
        path: PathBuf,
        force: bool,
        directories: bool,
    },
    ResetHard(PathBuf),
    AddAll(PathBuf),
    Stash(PathBuf, String),
    Checkout(PathBuf, String),
    Pull(PathBuf, String, String),
}

#[derive(Default)]
struct GitState {
    status: WorkingCopyStatus,
    fail_clone: bool,
    fail_pull: bool,
    calls: Vec<GitCall>,
}

/// Recording [`GitOperations`]. Clones share the same state.
#[derive(Clone, Default)]
pub struct MockGit {
    state: Arc<Mutex<GitState>>,
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Status reported for every existing working copy.
    pub fn with_status(self, status: WorkingCopyStatus) -> Self {
        self.lock().status = status;
        self
    }

    pub fn failing_clone(self) -> Self {
        self.lock().fail_clone = true;
        self
    }

    pub fn failing_pull(self) -> Self {
        self.lock().fail_pull = true;
        self
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.lock().calls.clone()
    }

    fn record(&self, call: GitCall) {
        self.lock().calls.push(call);
    }
}

impl GitOperations for MockGit {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        self.record(GitCall::Clone {
            url: url.to_string(),
            path: target_dir.to_path_buf(),
        });
        if self.lock().fail_clone {
            return Err(Error::GitClone {
                url: url.to_string(),
                path: target_dir.display().to_string(),
                message: "injected failure".to_string(),
            });
        }
        fs::create_dir_all(target_dir)?;
        Ok(())
    }

    fn status(&self, path: &Path) -> Result<WorkingCopyStatus> {
        self.record(GitCall::Status(path.to_path_buf()));
        Ok(self.lock().status.clone())
    }

    fn clean(&self, path: &Path, force: bool, directories: bool) -> Result<()> {
        self.record(GitCall::Clean {
            path: path.to_path_buf(),
            force,
            directories,
        });
        self.lock().status = WorkingCopyStatus::default();
        Ok(())
    }

    fn reset_hard(&self, path: &Path) -> Result<()> {
        self.record(GitCall::ResetHard(path.to_path_buf()));
        Ok(())
    }

    fn add_all(&self, path: &Path) -> Result<()> {
        self.record(GitCall::AddAll(path.to_path_buf()));
        Ok(())
    }

    fn stash(&self, path: &Path, message: &str) -> Result<()> {
        self.record(GitCall::Stash(path.to_path_buf(), message.to_string()));
        self.lock().status = WorkingCopyStatus::default();
        Ok(())
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<()> {
        self.record(GitCall::Checkout(path.to_path_buf(), branch.to_string()));
        Ok(())
    }

    fn pull(&self, path: &Path, remote: &str, branch: &str) -> Result<()> {
        self.record(GitCall::Pull(
            path.to_path_buf(),
            remote.to_string(),
            branch.to_string(),
        ));
        if self.lock().fail_pull {
            return Err(Error::GitCommand {
                command: format!("pull {} {}", remote, branch),
                path: path.display().to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}
