//! # Mailmap Command Implementation
//!
//! Builds the canonical `.mailmap` from a local seed file plus every
//! repository's copy, writes it locally, then pushes it to every
//! non-archived repository. Nothing is pushed if any read fails.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use repo_fleet::deploy::BranchNamer;
use repo_fleet::mailmap::MailmapSynchronizer;

use super::push::describe;
use super::Context;

/// Merge every repository's .mailmap and push the result back
#[derive(Args, Debug)]
pub struct MailmapArgs {
    /// Local seed file; also the output unless --output is given
    #[arg(value_name = "SEED")]
    pub seed: PathBuf,

    /// Where to write the merged file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

pub fn execute(args: MailmapArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    if !args.seed.is_file() {
        bail!("Seed file not found: {}", args.seed.display());
    }
    let output = args.output.unwrap_or_else(|| args.seed.clone());
    let repos = ctx.working_set(&client)?;

    let report = MailmapSynchronizer::new(&client, ctx.logger.clone())
        .with_runner(ctx.runner())
        .with_branch_namer(BranchNamer::new(&ctx.config.branch_prefix))
        .synchronize(&args.seed, &output, &repos)?;

    println!(
        "{} lines from {} repositories written to {}",
        report.merged.len(),
        report.contributors,
        output.display()
    );
    for (name, result) in &report.outcomes {
        ctx.report(name, result, describe);
    }
    ctx.finish(&report.summary)
}
