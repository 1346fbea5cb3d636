//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;

/// repo-fleet - Bulk operations across every repository of an organization
#[derive(Parser, Debug)]
#[command(name = "repo-fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (defaults to .repo-fleet.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Organization to operate on; repeat or comma-separate for several
    #[arg(
        long = "org",
        global = true,
        value_name = "ORG",
        env = "REPO_FLEET_ORGS",
        value_delimiter = ','
    )]
    pub orgs: Vec<String>,

    /// API token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root, for GitHub Enterprise installations
    #[arg(long, global = true, value_name = "URL", env = "REPO_FLEET_API_URL")]
    pub api_url: Option<String>,

    /// Repositories processed in parallel
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Only repositories whose name matches this glob (repeatable)
    #[arg(long, global = true, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip repositories whose name matches this glob (repeatable)
    #[arg(long, global = true, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Only repositories carrying this topic
    #[arg(long, global = true, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Skip forked repositories
    #[arg(long, global = true)]
    pub skip_forks: bool,

    /// Exit with an error when any repository fails
    #[arg(long, global = true)]
    pub fail_on_error: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the repositories in the working set
    List(commands::list::ListArgs),

    /// Push a local file to every repository through a pull request
    Push(commands::push::PushArgs),

    /// Merge every repository's .mailmap and push the result back
    Mailmap(commands::mailmap::MailmapArgs),

    /// Audit repository licenses
    Licenses(commands::licenses::LicensesArgs),

    /// List pull requests across the working set
    Pulls(commands::pulls::PullsArgs),

    /// Clone or update a local copy of every repository
    Clone(commands::clone::CloneArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global.log_level);

        let command = match self.command {
            Commands::Completions(args) => return commands::completions::execute(args),
            other => other,
        };

        let ctx = commands::Context::new(self.global)?;
        match command {
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Push(args) => commands::push::execute(args, &ctx),
            Commands::Mailmap(args) => commands::mailmap::execute(args, &ctx),
            Commands::Licenses(args) => commands::licenses::execute(args, &ctx),
            Commands::Pulls(args) => commands::pulls::execute(args, &ctx),
            Commands::Clone(args) => commands::clone::execute(args, &ctx),
            Commands::Completions(_) => Ok(()),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
