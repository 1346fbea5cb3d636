//! # Licenses Command Implementation
//!
//! Audits the license of every public, non-archived repository in the
//! working set against the allowed list (`--allow`, or `allowed_licenses`
//! in the config file). Problems are logged as errors; with
//! `--fail-on-error` they also make the command fail.

use anyhow::{bail, Result};
use clap::Args;

use repo_fleet::batch::OutcomeKind;
use repo_fleet::license::{AllowedLicenses, LicenseAuditor, LicenseStatus};

use super::Context;

/// Audit repository licenses
#[derive(Args, Debug)]
pub struct LicensesArgs {
    /// Allowed license identifiers, or `:all`
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub allow: Vec<String>,
}

pub fn execute(args: LicensesArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let allowed = if args.allow.is_empty() {
        ctx.config.allowed_licenses.clone()
    } else {
        AllowedLicenses::from_list(&args.allow)
    };
    let repos = ctx.working_set(&client)?;

    let report = LicenseAuditor::new(allowed, ctx.logger.clone()).audit(&repos);
    for (name, status) in &report.entries {
        let kind = match status {
            LicenseStatus::Allowed(_) => OutcomeKind::Succeeded,
            _ => OutcomeKind::Failed,
        };
        println!("{} {}: {}", ctx.output.marker(kind), name, status);
    }
    println!();
    println!(
        "{} allowed, {} not allowed, {} missing",
        report.allowed(),
        report.disallowed(),
        report.missing()
    );
    if ctx.fail_on_error() && report.has_problems() {
        bail!(
            "{} repositories have license problems",
            report.disallowed() + report.missing()
        );
    }
    Ok(())
}
