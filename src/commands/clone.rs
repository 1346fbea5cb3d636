//! # Clone Command Implementation
//!
//! Clones every repository of the working set that has no local copy yet and
//! updates the others from their default branch. Local copies live under
//! `<directory>/<org>/<name>`, or `<directory>/<name>` with `--shallow`.
//!
//! Dirty copies are skipped unless `--stash` (stash the changes first) or
//! `--force` (discard them) is given.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use repo_fleet::batch::BatchSummary;
use repo_fleet::config::Overrides;
use repo_fleet::local_sync::{LocalSyncEngine, SyncOptions, SyncOutcome};

use super::Context;

/// Clone or update a local copy of every repository
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Root directory for local copies (default: ~/src)
    #[arg(short, long, value_name = "DIR", env = "REPO_FLEET_DIR")]
    pub directory: Option<PathBuf>,

    /// Lay out copies as <dir>/<name> instead of <dir>/<org>/<name>
    #[arg(long)]
    pub shallow: bool,

    /// Discard local changes, untracked files included
    #[arg(long)]
    pub force: bool,

    /// Stash local changes instead of skipping dirty copies
    #[arg(long)]
    pub stash: bool,
}

pub fn execute(args: CloneArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let mut config = ctx.config.clone();
    config.apply(Overrides {
        directory: args.directory,
        shallow: args.shallow.then_some(true),
        ..Default::default()
    });
    let root = config.clone_root();
    let options = SyncOptions {
        skip_dirty: !args.stash,
        force: args.force,
        shallow: config.shallow,
    };
    let repos = ctx.working_set(&client)?;

    let engine = LocalSyncEngine::new(ctx.logger.clone());
    let bar = ctx.output.progress(repos.len(), "syncing");
    let results = ctx.runner().run(&repos, |repo| {
        let outcome = engine.sync(repo, &root, options);
        bar.inc(1);
        outcome
    });
    bar.finish_and_clear();

    for (repo, result) in repos.iter().zip(&results) {
        ctx.report(&repo.full_name, result, describe);
    }
    ctx.finish(&BatchSummary::from_results(&results))
}

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Cloned(path) => format!("cloned into {}", path.display()),
        SyncOutcome::Updated {
            path,
            reset: true,
            ..
        } => format!("reset and updated {}", path.display()),
        SyncOutcome::Updated {
            path,
            stashed: Some(message),
            ..
        } => format!("updated {}, changes stashed as \"{}\"", path.display(), message),
        SyncOutcome::Updated { path, .. } => format!("updated {}", path.display()),
        SyncOutcome::SkippedDirty(path) => {
            format!("skipped, uncommitted changes in {}", path.display())
        }
        SyncOutcome::Failed(e) => format!("failed, {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_stash() {
        let outcome = SyncOutcome::Updated {
            path: PathBuf::from("/src/acme/a"),
            reset: false,
            stashed: Some("auto".to_string()),
        };
        assert_eq!(
            describe(&outcome),
            "updated /src/acme/a, changes stashed as \"auto\""
        );
    }
}
