//! # List Command Implementation
//!
//! Prints the working set: every repository of the configured organizations
//! that passes the global filters. Read-only.

use anyhow::Result;
use clap::Args;

use repo_fleet::models::Repository;

use super::Context;

/// List the repositories in the working set
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show default branch, license and flags
    #[arg(short, long)]
    pub long: bool,

    /// Show only the number of repositories
    #[arg(long)]
    pub count: bool,
}

pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let repos = ctx.working_set(&client)?;

    if args.count {
        println!("{}", repos.len());
        return Ok(());
    }
    for repo in &repos {
        if args.long {
            println!("{}", long_line(repo));
        } else {
            println!("{}", repo.full_name);
        }
    }
    Ok(())
}

fn long_line(repo: &Repository) -> String {
    let license = repo
        .license
        .as_ref()
        .map(|l| l.identifier().to_string())
        .unwrap_or_else(|| "-".to_string());
    let flags: Vec<&str> = [
        (repo.archived, "archived"),
        (repo.fork, "fork"),
        (repo.private, "private"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| *name)
    .collect();
    format!(
        "{}\t{}\t{}\t{}",
        repo.full_name,
        repo.default_branch,
        license,
        flags.join(",")
    )
}
