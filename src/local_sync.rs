//! # Local Working Copy Synchronization
//!
//! [`LocalSyncEngine`] reconciles a local clone with its remote default
//! branch. Decisions are made in this order:
//!
//! 1. Map the repository to its directory (`root/org/name`, or `root/name`
//!    with the shallow layout).
//! 2. Missing directory: clone into it. Done.
//! 3. Existing directory: inspect its status.
//!    - `force`: hard reset and `clean -fd`, whatever the status.
//!    - otherwise, dirty and `skip_dirty`: skip, touching nothing.
//!    - otherwise, dirty: stage everything and stash it under a named entry.
//! 4. Checkout the default branch and pull it from `origin`.
//!
//! Git access goes through the [`GitOperations`] trait so the decision logic
//! can be tested without a `git` binary.

use std::path::{Path, PathBuf};

use crate::batch::{Outcome, OutcomeKind};
use crate::error::Result;
use crate::git::{self, WorkingCopyStatus};
use crate::logging::Logger;
use crate::models::Repository;

const REMOTE: &str = "origin";

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones `url` into `target_dir`, creating parent directories.
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// Opens the working copy at `path` and reports its status.
    fn status(&self, path: &Path) -> Result<WorkingCopyStatus>;

    fn clean(&self, path: &Path, force: bool, directories: bool) -> Result<()>;

    fn reset_hard(&self, path: &Path) -> Result<()>;

    /// Stages every change, untracked files included.
    fn add_all(&self, path: &Path) -> Result<()>;

    fn stash(&self, path: &Path, message: &str) -> Result<()>;

    fn checkout(&self, path: &Path, branch: &str) -> Result<()>;

    fn pull(&self, path: &Path, remote: &str, branch: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        git::clone(url, target_dir)
    }

    fn status(&self, path: &Path) -> Result<WorkingCopyStatus> {
        git::status(path)
    }

    fn clean(&self, path: &Path, force: bool, directories: bool) -> Result<()> {
        git::clean(path, force, directories)
    }

    fn reset_hard(&self, path: &Path) -> Result<()> {
        git::reset_hard(path)
    }

    fn add_all(&self, path: &Path) -> Result<()> {
        git::add_all(path)
    }

    fn stash(&self, path: &Path, message: &str) -> Result<()> {
        git::stash(path, message)
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<()> {
        git::checkout(path, branch)
    }

    fn pull(&self, path: &Path, remote: &str, branch: &str) -> Result<()> {
        git::pull(path, remote, branch)
    }
}

/// Knobs for one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Leave dirty working copies alone. When `false`, dirty changes are stashed.
    pub skip_dirty: bool,
    /// Discard all local changes, untracked files included. Wins over `skip_dirty`.
    pub force: bool,
    /// Use `root/name` instead of `root/org/name`.
    pub shallow: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            skip_dirty: true,
            force: false,
            shallow: false,
        }
    }
}

/// What happened to one repository.
#[derive(Debug)]
pub enum SyncOutcome {
    Cloned(PathBuf),
    Updated {
        path: PathBuf,
        /// Local changes were discarded.
        reset: bool,
        /// Local changes were stashed under this message.
        stashed: Option<String>,
    },
    /// Dirty working copy left untouched.
    SkippedDirty(PathBuf),
    Failed(crate::error::Error),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

impl Outcome for SyncOutcome {
    fn kind(&self) -> OutcomeKind {
        match self {
            SyncOutcome::Cloned(_) | SyncOutcome::Updated { .. } => OutcomeKind::Succeeded,
            SyncOutcome::SkippedDirty(_) => OutcomeKind::Skipped,
            SyncOutcome::Failed(_) => OutcomeKind::Failed,
        }
    }
}

pub struct LocalSyncEngine {
    git: Box<dyn GitOperations>,
    logger: Logger,
}

impl LocalSyncEngine {
    pub fn new(logger: Logger) -> Self {
        Self::with_operations(Box::new(DefaultGitOperations), logger)
    }

    /// Creates an engine with a custom `GitOperations` implementation.
    pub fn with_operations(git: Box<dyn GitOperations>, logger: Logger) -> Self {
        Self { git, logger }
    }

    /// Syncs one repository under `root`. Never returns an error: failures
    /// are logged and reported as [`SyncOutcome::Failed`].
    pub fn sync(&self, repo: &Repository, root: &Path, options: SyncOptions) -> SyncOutcome {
        match self.try_sync(repo, root, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger
                    .error(format_args!("{}: sync failed: {}", repo.full_name, e));
                SyncOutcome::Failed(e)
            }
        }
    }

    fn try_sync(&self, repo: &Repository, root: &Path, options: SyncOptions) -> Result<SyncOutcome> {
        let path = repo.local_path(root, options.shallow);

        if !path.exists() {
            self.logger.info(format_args!(
                "{}: cloning into {}",
                repo.full_name,
                path.display()
            ));
            self.git.clone_repo(&repo.clone_url, &path)?;
            return Ok(SyncOutcome::Cloned(path));
        }

        let status = self.git.status(&path)?;
        let mut reset = false;
        let mut stashed = None;

        if options.force {
            self.logger.warn(format_args!(
                "{}: discarding local changes in {}",
                repo.full_name,
                path.display()
            ));
            self.git.reset_hard(&path)?;
            self.git.clean(&path, true, true)?;
            reset = true;
        } else if status.is_dirty() {
            if options.skip_dirty {
                self.logger.info(format_args!(
                    "{}: skipping, uncommitted changes in {}",
                    repo.full_name,
                    path.display()
                ));
                return Ok(SyncOutcome::SkippedDirty(path));
            }
            let message = stash_message();
            self.logger.info(format_args!(
                "{}: stashing local changes as \"{}\"",
                repo.full_name, message
            ));
            self.git.add_all(&path)?;
            self.git.stash(&path, &message)?;
            stashed = Some(message);
        }

        self.git.checkout(&path, &repo.default_branch)?;
        self.git.pull(&path, REMOTE, &repo.default_branch)?;
        self.logger.info(format_args!(
            "{}: updated {} from {}/{}",
            repo.full_name,
            path.display(),
            REMOTE,
            repo.default_branch
        ));

        Ok(SyncOutcome::Updated {
            path,
            reset,
            stashed,
        })
    }
}

fn stash_message() -> String {
    format!(
        "repo-fleet auto-stash {}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    )
}
