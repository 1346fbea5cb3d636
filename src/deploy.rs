//! # Remote Template Deployment
//!
//! [`RemoteTemplateDeployer`] writes one file into one repository through a
//! pull request. Per repository:
//!
//! 1. Archived repositories are skipped; they are never mutated.
//! 2. The default branch tip is resolved.
//! 3. The destination is read on the default branch. If it exists and
//!    overwriting is off, the repository is skipped: no branch, no pull
//!    request. Repeated non-overwriting pushes are therefore no-ops.
//! 4. A new branch is created from the tip.
//! 5. The file is created, or updated against the revision read in step 3.
//! 6. A pull request is opened from the new branch to the default branch.
//!
//! A failure in steps 2-6 ends that repository's deployment and is logged.
//! A branch created before the failure is left in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::batch::{Outcome, OutcomeKind};
use crate::defaults;
use crate::error::{Error, Result};
use crate::hosting::HostingApi;
use crate::logging::Logger;
use crate::models::{PullRequest, Repository};

/// A file to push: its bytes, where it goes, and whether to replace an
/// existing copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDeployment {
    pub source: Option<PathBuf>,
    pub destination: String,
    pub overwrite: bool,
    content: Vec<u8>,
}

impl TemplateDeployment {
    /// Reads `source` once; the bytes are shared by every repository.
    pub fn from_file(source: &Path, destination: &str, overwrite: bool) -> Result<Self> {
        let content = std::fs::read(source)?;
        Ok(Self {
            source: Some(source.to_path_buf()),
            destination: destination.trim_start_matches('/').to_string(),
            overwrite,
            content,
        })
    }

    pub fn from_bytes(destination: &str, content: impl Into<Vec<u8>>, overwrite: bool) -> Self {
        Self {
            source: None,
            destination: destination.trim_start_matches('/').to_string(),
            overwrite,
            content: content.into(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn message(&self) -> String {
        defaults::commit_message(&self.destination)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Archived,
    /// The destination exists and overwriting is off.
    AlreadyPresent,
}

#[derive(Debug)]
pub enum DeployOutcome {
    Created {
        branch: String,
        pull_request: PullRequest,
    },
    Updated {
        branch: String,
        pull_request: PullRequest,
    },
    Skipped(SkipReason),
    Failed(Error),
}

impl Outcome for DeployOutcome {
    fn kind(&self) -> OutcomeKind {
        match self {
            DeployOutcome::Created { .. } | DeployOutcome::Updated { .. } => OutcomeKind::Succeeded,
            DeployOutcome::Skipped(_) => OutcomeKind::Skipped,
            DeployOutcome::Failed(_) => OutcomeKind::Failed,
        }
    }
}

static BRANCH_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Produces `<prefix>-<UTC %Y%m%d%H%M%S>-<seq>` branch names.
///
/// `seq` is process-wide and strictly increasing, so two names taken in the
/// same second still differ.
#[derive(Debug, Clone)]
pub struct BranchNamer {
    prefix: String,
}

impl BranchNamer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn next(&self) -> String {
        self.name_at(Utc::now())
    }

    pub fn name_at(&self, now: DateTime<Utc>) -> String {
        let seq = BRANCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", self.prefix, now.format("%Y%m%d%H%M%S"), seq)
    }
}

impl Default for BranchNamer {
    fn default() -> Self {
        Self::new(defaults::BRANCH_PREFIX)
    }
}

pub struct RemoteTemplateDeployer<'a> {
    api: &'a dyn HostingApi,
    logger: Logger,
    branches: BranchNamer,
}

impl<'a> RemoteTemplateDeployer<'a> {
    pub fn new(api: &'a dyn HostingApi, logger: Logger) -> Self {
        Self {
            api,
            logger,
            branches: BranchNamer::default(),
        }
    }

    pub fn with_branch_namer(mut self, branches: BranchNamer) -> Self {
        self.branches = branches;
        self
    }

    /// Pushes `deployment` into `repo`. Never returns an error: failures are
    /// logged and reported as [`DeployOutcome::Failed`].
    pub fn deploy(&self, repo: &Repository, deployment: &TemplateDeployment) -> DeployOutcome {
        if repo.archived {
            self.logger
                .info(format_args!("{}: archived, skipping", repo.full_name));
            return DeployOutcome::Skipped(SkipReason::Archived);
        }

        let mut created_branch = None;
        match self.push(repo, deployment, &mut created_branch) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.error(format_args!(
                    "{}: failed to push {}: {}",
                    repo.full_name, deployment.destination, e
                ));
                if let Some(branch) = created_branch {
                    self.logger.warn(format_args!(
                        "{}: branch {} was left behind without a pull request",
                        repo.full_name, branch
                    ));
                }
                DeployOutcome::Failed(e)
            }
        }
    }

    fn push(
        &self,
        repo: &Repository,
        deployment: &TemplateDeployment,
        created_branch: &mut Option<String>,
    ) -> Result<DeployOutcome> {
        let name = repo.full_name.as_str();
        let base = repo.default_branch.as_str();
        let path = deployment.destination.as_str();

        let tip = self.api.get_ref(name, &format!("heads/{}", base))?;
        let existing = self.api.get_content(name, path, Some(base))?;

        if existing.is_some() && !deployment.overwrite {
            self.logger.info(format_args!(
                "{}: {} already exists, skipping",
                name, path
            ));
            return Ok(DeployOutcome::Skipped(SkipReason::AlreadyPresent));
        }

        let branch = self.branches.next();
        self.api
            .create_ref(name, &format!("refs/heads/{}", branch), tip.sha())?;
        *created_branch = Some(branch.clone());

        let message = deployment.message();
        match &existing {
            None => self
                .api
                .create_content(name, path, &message, deployment.content(), &branch)?,
            Some(current) => self.api.update_content(
                name,
                path,
                &message,
                deployment.content(),
                &current.sha,
                &branch,
            )?,
        }

        let pull_request = self
            .api
            .create_pull_request(name, base, &branch, &message, &message)?;
        self.logger.info(format_args!(
            "{}: opened #{} for {} ({})",
            name, pull_request.number, path, pull_request.html_url
        ));

        Ok(match existing {
            None => DeployOutcome::Created {
                branch,
                pull_request,
            },
            Some(_) => DeployOutcome::Updated {
                branch,
                pull_request,
            },
        })
    }
}
