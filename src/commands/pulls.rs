//! # Pulls Command Implementation
//!
//! Lists pull requests across the working set, one per line as
//! `owner/repo#number title (url)`. Archived repositories are skipped.

use anyhow::Result;
use clap::Args;

use repo_fleet::models::{PullRequestQuery, PullRequestState};
use repo_fleet::pulls::PullRequestCollector;

use super::Context;

/// List pull requests across the working set
#[derive(Args, Debug)]
pub struct PullsArgs {
    /// Pull request state
    #[arg(long, value_enum, default_value = "open")]
    pub state: PullRequestState,

    /// Only pull requests targeting this base branch
    #[arg(long, value_name = "BRANCH")]
    pub base: Option<String>,
}

pub fn execute(args: PullsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let repos = ctx.working_set(&client)?;
    let query = PullRequestQuery {
        state: args.state,
        base: args.base,
    };

    let mut found = 0usize;
    PullRequestCollector::new(&client, ctx.logger.clone()).for_each(&repos, &query, |pr, repo| {
        found += 1;
        println!("{}#{} {} ({})", repo.full_name, pr.number, pr.title, pr.html_url);
    });
    log::info!("{} pull request(s)", found);
    Ok(())
}
