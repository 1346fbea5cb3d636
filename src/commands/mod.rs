//! # CLI Command Implementations
//!
//! Each subcommand lives in its own file with an `Args` struct derived with
//! `clap` and an `execute` function. Commands that talk to the hosting API
//! share a [`Context`] built once from the global flags.

pub mod clone;
pub mod completions;
pub mod licenses;
pub mod list;
pub mod mailmap;
pub mod pulls;
pub mod push;

use anyhow::{bail, Result};

use repo_fleet::batch::{BatchRunner, BatchSummary, Outcome, OutcomeKind};
use repo_fleet::config::{self, FleetConfig, Overrides};
use repo_fleet::enumerate::RepositoryEnumerator;
use repo_fleet::filter::{AllOf, HasTopic, NameFilter, SkipForks};
use repo_fleet::github::GitHubClient;
use repo_fleet::hosting::HostingApi;
use repo_fleet::logging::Logger;
use repo_fleet::models::Repository;
use repo_fleet::output::OutputConfig;

use crate::cli::GlobalArgs;

/// Resolved configuration and output settings for one invocation.
pub struct Context {
    pub config: FleetConfig,
    pub output: OutputConfig,
    pub logger: Logger,
    global: GlobalArgs,
}

impl Context {
    pub fn new(global: GlobalArgs) -> Result<Self> {
        let mut config = config::load(global.config.as_deref())?;
        config.apply(Overrides {
            organizations: global.orgs.clone(),
            token: global.token.clone(),
            api_url: global.api_url.clone(),
            jobs: global.jobs,
            ..Default::default()
        });
        Ok(Self {
            config,
            output: OutputConfig::from_env_and_flag(&global.color),
            logger: Logger::facade(),
            global,
        })
    }

    /// Checks the credential before anything touches the network.
    pub fn client(&self) -> Result<GitHubClient> {
        let token = self.config.require_token()?;
        let client = GitHubClient::new(
            self.config.api_base()?,
            token,
            self.config.client_options(),
        );
        Ok(client.with_logger(self.logger.clone()))
    }

    pub fn filter(&self) -> Result<AllOf> {
        let mut filter = AllOf::new();
        if !self.global.include.is_empty() || !self.global.exclude.is_empty() {
            filter = filter.with(NameFilter::new(&self.global.include, &self.global.exclude)?);
        }
        if self.global.skip_forks {
            filter = filter.with(SkipForks);
        }
        if let Some(topic) = &self.global.topic {
            filter = filter.with(HasTopic(topic.clone()));
        }
        Ok(filter)
    }

    /// The filtered repositories of every configured organization.
    pub fn working_set(&self, api: &dyn HostingApi) -> Result<Vec<Repository>> {
        let orgs = self.config.require_organizations()?;
        let filter = self.filter()?;
        Ok(RepositoryEnumerator::new(api, self.logger.clone()).enumerate(orgs, &filter)?)
    }

    pub fn runner(&self) -> BatchRunner {
        BatchRunner::new(self.config.jobs, self.logger.clone())
    }

    /// Prints one per-repository result line.
    pub fn report<R: Outcome>(
        &self,
        name: &str,
        result: &repo_fleet::error::Result<R>,
        describe: impl Fn(&R) -> String,
    ) {
        match result {
            Ok(outcome) => println!(
                "{} {}: {}",
                self.output.marker(outcome.kind()),
                name,
                describe(outcome)
            ),
            Err(e) => println!("{} {}: {}", self.output.marker(OutcomeKind::Skipped), name, e),
        }
    }

    /// Prints the batch summary and applies `--fail-on-error`.
    pub fn finish(&self, summary: &BatchSummary) -> Result<()> {
        println!();
        println!("{}", summary);
        if self.global.fail_on_error && summary.failed > 0 {
            bail!("{} repositories failed", summary.failed);
        }
        Ok(())
    }

    pub fn fail_on_error(&self) -> bool {
        self.global.fail_on_error
    }
}
