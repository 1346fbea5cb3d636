//! Collects pull requests across the working set.
//!
//! Archived repositories are skipped. Listings are paged through completely.
//! A repository whose listing fails is logged and left out; the others are
//! still collected.

use crate::error::Result;
use crate::hosting::{self, HostingApi};
use crate::logging::Logger;
use crate::models::{PullRequest, PullRequestQuery, Repository};

pub struct PullRequestCollector<'a> {
    api: &'a dyn HostingApi,
    logger: Logger,
}

impl<'a> PullRequestCollector<'a> {
    pub fn new(api: &'a dyn HostingApi, logger: Logger) -> Self {
        Self { api, logger }
    }

    /// Every pull request of one repository matching `query`.
    pub fn for_repository(
        &self,
        repo: &Repository,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>> {
        hosting::pull_requests(self.api, &repo.full_name, query).collect_all()
    }

    /// Hands each `(pull request, repository)` pair to `f` as it is found.
    pub fn for_each<F>(&self, repos: &[Repository], query: &PullRequestQuery, mut f: F)
    where
        F: FnMut(PullRequest, &Repository),
    {
        for repo in repos.iter().filter(|r| !r.archived) {
            match self.for_repository(repo, query) {
                Ok(pulls) => pulls.into_iter().for_each(|pr| f(pr, repo)),
                Err(e) => self.logger.error(format_args!(
                    "{}: could not list pull requests: {}",
                    repo.full_name, e
                )),
            }
        }
    }

    pub fn collect(
        &self,
        repos: &[Repository],
        query: &PullRequestQuery,
    ) -> Vec<(PullRequest, Repository)> {
        let mut found = Vec::new();
        self.for_each(repos, query, |pr, repo| found.push((pr, repo.clone())));
        found
    }
}
