//! # Contributor Identity Map Synchronization
//!
//! The canonical `.mailmap` is the set union of the seed file's lines and
//! every repository's `.mailmap` lines: deduplicated, case-sensitive, sorted.
//!
//! [`MailmapSynchronizer::synchronize`] runs in two phases:
//!
//! - **gather**: read the seed, then `.mailmap` from every repository in the
//!   working set, archived ones included. A repository without the file adds
//!   nothing. Any other read failure aborts the run, so an incomplete merge
//!   is never redistributed.
//! - **redistribute**: after the merged file has been written to the output
//!   path, push it to every non-archived repository with overwrite on.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::batch::{BatchRunner, BatchSummary};
use crate::defaults::MAILMAP_PATH;
use crate::deploy::{BranchNamer, DeployOutcome, RemoteTemplateDeployer, TemplateDeployment};
use crate::error::Result;
use crate::hosting::HostingApi;
use crate::logging::Logger;
use crate::models::Repository;

/// A deduplicated, sorted set of mailmap lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mailmap {
    lines: BTreeSet<String>,
}

impl Mailmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses file text; blank lines are dropped and line endings trimmed.
    pub fn parse(text: &str) -> Self {
        let mut mailmap = Self::new();
        mailmap.merge_text(text);
        mailmap
    }

    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn merge_text(&mut self, text: &str) {
        self.lines.extend(
            text.lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string),
        );
    }

    pub fn merge(&mut self, other: Mailmap) {
        self.lines.extend(other.lines);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// One line per entry, each newline-terminated.
    pub fn render(&self) -> String {
        self.lines.iter().fold(String::new(), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// Result of a full synchronization.
#[derive(Debug)]
pub struct MailmapReport {
    pub merged: Mailmap,
    /// Repositories that contributed a `.mailmap`.
    pub contributors: usize,
    pub outcomes: Vec<(String, Result<DeployOutcome>)>,
    pub summary: BatchSummary,
}

pub struct MailmapSynchronizer<'a> {
    api: &'a dyn HostingApi,
    logger: Logger,
    runner: BatchRunner,
    branches: BranchNamer,
}

impl<'a> MailmapSynchronizer<'a> {
    pub fn new(api: &'a dyn HostingApi, logger: Logger) -> Self {
        let runner = BatchRunner::sequential(logger.clone());
        Self {
            api,
            logger,
            runner,
            branches: BranchNamer::default(),
        }
    }

    /// Names the branches the merged file is pushed through.
    pub fn with_branch_namer(mut self, branches: BranchNamer) -> Self {
        self.branches = branches;
        self
    }

    pub fn with_runner(mut self, runner: BatchRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Gather phase: seed lines plus every repository's `.mailmap`.
    pub fn gather(&self, seed: &Path, repos: &[Repository]) -> Result<(Mailmap, usize)> {
        let mut merged = Mailmap::read(seed)?;
        let mut contributors = 0;
        for repo in repos {
            match self.api.get_content(&repo.full_name, MAILMAP_PATH, None)? {
                Some(file) => {
                    let before = merged.len();
                    merged.merge_text(&file.text());
                    contributors += 1;
                    self.logger.debug(format_args!(
                        "{}: {} new mailmap line(s)",
                        repo.full_name,
                        merged.len() - before
                    ));
                }
                None => self
                    .logger
                    .debug(format_args!("{}: no {}", repo.full_name, MAILMAP_PATH)),
            }
        }
        Ok((merged, contributors))
    }

    /// Gathers, writes the merged file to `output`, then pushes it to every
    /// non-archived repository.
    ///
    /// Returns an error only for failures before redistribution starts.
    pub fn synchronize(
        &self,
        seed: &Path,
        output: &Path,
        repos: &[Repository],
    ) -> Result<MailmapReport> {
        let (merged, contributors) = self.gather(seed, repos)?;
        merged.write(output)?;
        self.logger.info(format_args!(
            "Wrote {} mailmap line(s) from {} repositories to {}",
            merged.len(),
            contributors,
            output.display()
        ));

        let deployment = TemplateDeployment::from_bytes(MAILMAP_PATH, merged.render(), true);
        let targets: Vec<&Repository> = repos.iter().filter(|r| !r.archived).collect();
        let deployer = RemoteTemplateDeployer::new(self.api, self.logger.clone())
            .with_branch_namer(self.branches.clone());
        let results = self
            .runner
            .run(&targets, |repo| deployer.deploy(repo, &deployment));
        let summary = BatchSummary::from_results(&results);
        self.logger
            .info(format_args!("Mailmap redistribution: {}", summary));

        let outcomes = targets
            .iter()
            .map(|r| r.full_name.clone())
            .zip(results)
            .collect();
        Ok(MailmapReport {
            merged,
            contributors,
            outcomes,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{HostCall, MockHost};
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_drops_blank_lines_and_duplicates() {
        let mailmap = Mailmap::parse("B <b@x>\n\nA <a@x>\r\n   \nB <b@x>\n");
        assert_eq!(mailmap.lines().collect::<Vec<_>>(), vec!["A <a@x>", "B <b@x>"]);
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let mut mailmap = Mailmap::parse("jane <jane@acme.io>\n");
        mailmap.merge_text("Jane <jane@acme.io>\n");
        assert_eq!(mailmap.len(), 2);
    }

    #[test]
    fn test_render_is_newline_terminated() {
        assert_eq!(Mailmap::parse("b\na\n").render(), "a\nb\n");
        assert_eq!(Mailmap::new().render(), "");
    }

    #[test]
    fn test_union_of_seed_and_repositories() {
        let dir = TempDir::new().unwrap();
        let seed = dir.path().join("seed");
        fs::write(&seed, "A\nB\n").unwrap();
        let repos = vec![
            Repository::new("acme/one", "main"),
            Repository::new("acme/two", "main"),
            Repository::new("acme/none", "main"),
        ];
        let host = MockHost::new()
            .with_org("acme", repos.clone())
            .with_file("acme/one", ".mailmap", "B\nC\n")
            .with_file("acme/two", ".mailmap", "D\n");
        let sync = MailmapSynchronizer::new(&host, Logger::null());

        let (merged, contributors) = sync.gather(&seed, &repos).unwrap();

        assert_eq!(merged.lines().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
        assert_eq!(contributors, 2);
    }

    #[test]
    fn test_gather_failure_prevents_redistribution() {
        let dir = TempDir::new().unwrap();
        let seed = dir.path().join("seed");
        let output = dir.path().join("out");
        fs::write(&seed, "A\n").unwrap();
        let repos = vec![
            Repository::new("acme/one", "main"),
            Repository::new("acme/two", "main"),
        ];
        let host = MockHost::new()
            .with_org("acme", repos.clone())
            .failing("get_content", "acme/two");
        let sync = MailmapSynchronizer::new(&host, Logger::null());

        assert!(sync.synchronize(&seed, &output, &repos).is_err());
        assert!(!output.exists());
        assert!(host.calls().iter().all(|c| !c.is_mutation()));
    }

    #[test]
    fn test_redistribution_overwrites_and_skips_archived() {
        let dir = TempDir::new().unwrap();
        let seed = dir.path().join("seed");
        let output = dir.path().join("nested").join(".mailmap");
        fs::write(&seed, "A\n").unwrap();
        let mut archived = Repository::new("acme/old", "main");
        archived.archived = true;
        let repos = vec![Repository::new("acme/one", "main"), archived];
        let host = MockHost::new()
            .with_org("acme", repos.clone())
            .with_file("acme/one", ".mailmap", "A\n")
            .with_file("acme/old", ".mailmap", "Z\n");
        let sync = MailmapSynchronizer::new(&host, Logger::null());

        let report = sync.synchronize(&seed, &output, &repos).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "A\nZ\n");
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(
            report.outcomes[0],
            (ref name, Ok(DeployOutcome::Updated { .. })) if name == "acme/one"
        ));
        assert!(host.mutations("acme/old").is_empty());
        assert!(host
            .calls()
            .iter()
            .any(|c| matches!(c, HostCall::UpdateContent { repo, .. } if repo == "acme/one")));
    }

    #[test]
    fn test_redistribution_uses_configured_branch_prefix() {
        let dir = TempDir::new().unwrap();
        let seed = dir.path().join(".mailmap");
        fs::write(&seed, "A\n").unwrap();
        let repos = vec![Repository::new("acme/one", "main")];
        let host = MockHost::new().with_org("acme", repos.clone());
        let sync = MailmapSynchronizer::new(&host, Logger::null())
            .with_branch_namer(BranchNamer::new("ops-sync"));

        sync.synchronize(&seed, &seed, &repos).unwrap();

        let refs: Vec<String> = host
            .mutations("acme/one")
            .into_iter()
            .filter_map(|c| match c {
                HostCall::CreateRef { reference, .. } => Some(reference),
                _ => None,
            })
            .collect();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].starts_with("refs/heads/ops-sync-"), "{}", refs[0]);
    }

    proptest! {
        #[test]
        fn prop_merge_is_order_independent(
            fragments in prop::collection::vec(prop::collection::vec("[A-Za-z <>@.]{1,12}", 0..5), 1..6),
        ) {
            let mut forward = Mailmap::new();
            for fragment in &fragments {
                forward.merge_text(&fragment.join("\n"));
            }
            let mut backward = Mailmap::new();
            for fragment in fragments.iter().rev() {
                backward.merge_text(&fragment.join("\n"));
            }
            prop_assert_eq!(forward.render(), backward.render());

            let lines: Vec<&str> = forward.lines().collect();
            let mut sorted = lines.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(lines, sorted);
        }
    }
}
