//! Process-level `git` invocations.
//!
//! Every function shells out to the system `git`, which picks up SSH keys,
//! credential helpers and whatever else is configured in `~/.gitconfig`.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Paths reported by `git status`, bucketed the way the sync engine needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingCopyStatus {
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

impl WorkingCopyStatus {
    /// Dirty means tracked changes: modified, added or deleted paths.
    /// Untracked files alone do not make a working copy dirty.
    pub fn is_dirty(&self) -> bool {
        !(self.modified.is_empty() && self.added.is_empty() && self.deleted.is_empty())
    }

    /// Parses `git status --porcelain` (v1) output.
    pub fn parse_porcelain(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines() {
            if line.len() < 4 {
                continue;
            }
            let (code, path) = line.split_at(3);
            let path = match path.split_once(" -> ") {
                Some((_, renamed_to)) => renamed_to,
                None => path,
            }
            .to_string();
            let mut code = code.chars();
            let index = code.next().unwrap_or(' ');
            let worktree = code.next().unwrap_or(' ');

            if index == '?' && worktree == '?' {
                status.untracked.push(path);
            } else if index == 'A' || index == 'C' {
                status.added.push(path);
            } else if index == 'D' || worktree == 'D' {
                status.deleted.push(path);
            } else if index != ' ' || worktree != ' ' {
                status.modified.push(path);
            }
        }
        status
    }
}

fn run(path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            path: path.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: args.join(" "),
            path: path.display().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Clone `url` into `target_dir`, creating parent directories first.
pub fn clone(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            path: target_dir.display().to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository \
                (SSH key in ssh-agent, credential helper, or access token). Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            path: target_dir.display().to_string(),
            message,
        });
    }

    Ok(())
}

pub fn status(path: &Path) -> Result<WorkingCopyStatus> {
    let output = run(path, &["status", "--porcelain"])?;
    Ok(WorkingCopyStatus::parse_porcelain(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// `git clean`; `force` adds `-f`, `directories` adds `-d`.
pub fn clean(path: &Path, force: bool, directories: bool) -> Result<()> {
    let mut args = vec!["clean"];
    if force {
        args.push("-f");
    }
    if directories {
        args.push("-d");
    }
    run(path, &args).map(|_| ())
}

pub fn reset_hard(path: &Path) -> Result<()> {
    run(path, &["reset", "--hard"]).map(|_| ())
}

/// Stage everything, untracked files included.
pub fn add_all(path: &Path) -> Result<()> {
    run(path, &["add", "--all"]).map(|_| ())
}

pub fn stash(path: &Path, message: &str) -> Result<()> {
    run(path, &["stash", "push", "--include-untracked", "-m", message]).map(|_| ())
}

pub fn checkout(path: &Path, branch: &str) -> Result<()> {
    run(path, &["checkout", branch]).map(|_| ())
}

pub fn pull(path: &Path, remote: &str, branch: &str) -> Result<()> {
    run(path, &["pull", remote, branch]).map(|_| ())
}

/// Whether a `git` binary can be executed.
pub fn available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
