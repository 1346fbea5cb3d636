//! # Push Command Implementation
//!
//! Pushes one local file to every repository of the working set. Each
//! repository gets a fresh branch, a commit and a pull request against its
//! default branch. Archived repositories are skipped, as are repositories
//! that already have the file unless `--overwrite` is given.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use repo_fleet::batch::BatchSummary;
use repo_fleet::deploy::{
    BranchNamer, DeployOutcome, RemoteTemplateDeployer, SkipReason, TemplateDeployment,
};

use super::Context;

/// Push a local file to every repository through a pull request
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Local file to push
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Repository-relative destination path
    #[arg(value_name = "DESTINATION")]
    pub destination: String,

    /// Replace the file where it already exists
    #[arg(long)]
    pub overwrite: bool,
}

pub fn execute(args: PushArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let deployment = TemplateDeployment::from_file(&args.template, &args.destination, args.overwrite)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;
    let repos = ctx.working_set(&client)?;

    let deployer = RemoteTemplateDeployer::new(&client, ctx.logger.clone())
        .with_branch_namer(BranchNamer::new(&ctx.config.branch_prefix));
    let bar = ctx.output.progress(repos.len(), "pushing");
    let results = ctx.runner().run(&repos, |repo| {
        let outcome = deployer.deploy(repo, &deployment);
        bar.inc(1);
        outcome
    });
    bar.finish_and_clear();

    for (repo, result) in repos.iter().zip(&results) {
        ctx.report(&repo.full_name, result, describe);
    }
    ctx.finish(&BatchSummary::from_results(&results))
}

pub(crate) fn describe(outcome: &DeployOutcome) -> String {
    match outcome {
        DeployOutcome::Created { pull_request, .. } => {
            format!("created, {}", pull_request.html_url)
        }
        DeployOutcome::Updated { pull_request, .. } => {
            format!("updated, {}", pull_request.html_url)
        }
        DeployOutcome::Skipped(SkipReason::Archived) => "skipped, archived".to_string(),
        DeployOutcome::Skipped(SkipReason::AlreadyPresent) => {
            "skipped, already present".to_string()
        }
        DeployOutcome::Failed(e) => format!("failed, {}", e),
    }
}
