//! Enumeration of the working set.
//!
//! [`RepositoryEnumerator`] is the only producer of repository descriptors.
//! For each organization, in the order given, it pages through the complete
//! listing before any filter runs, so a filter always sees a consistent
//! repository list. Any failure aborts the whole enumeration: callers never
//! act on a partial list.

use crate::error::Result;
use crate::filter::RepositoryFilter;
use crate::hosting::{self, HostingApi};
use crate::logging::Logger;
use crate::models::Repository;

pub struct RepositoryEnumerator<'a> {
    api: &'a dyn HostingApi,
    logger: Logger,
}

impl<'a> RepositoryEnumerator<'a> {
    pub fn new(api: &'a dyn HostingApi, logger: Logger) -> Self {
        Self { api, logger }
    }

    /// Every repository of every organization, unfiltered, in API order.
    pub fn fetch_all(&self, orgs: &[String]) -> Result<Vec<Repository>> {
        let mut all = Vec::new();
        for org in orgs {
            let repos = hosting::org_repositories(self.api, org).collect_all()?;
            self.logger.debug(format_args!(
                "{}: {} repositories",
                org,
                repos.len()
            ));
            all.extend(repos);
        }
        Ok(all)
    }

    /// Fetches everything, then keeps what `filter` accepts.
    pub fn enumerate(
        &self,
        orgs: &[String],
        filter: &dyn RepositoryFilter,
    ) -> Result<Vec<Repository>> {
        let all = self.fetch_all(orgs)?;
        let total = all.len();
        let selected: Vec<Repository> = all
            .into_iter()
            .filter(|repo| filter.accept(self.api, repo))
            .collect();
        self.logger.info(format_args!(
            "Selected {} of {} repositories across {} organization(s)",
            selected.len(),
            total,
            orgs.len()
        ));
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AcceptAll, SkipForks};
    use crate::testing::{HostCall, MockHost};
    use proptest::prelude::*;

    fn repos(org: &str, names: &[&str]) -> Vec<Repository> {
        names
            .iter()
            .map(|n| Repository::new(&format!("{}/{}", org, n), "main"))
            .collect()
    }

    fn names(repos: &[Repository]) -> Vec<String> {
        repos.iter().map(|r| r.full_name.clone()).collect()
    }

    fn orgs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_concatenates_pages_in_order() {
        let host = MockHost::new().with_org_pages(
            "acme",
            vec![repos("acme", &["a", "b"]), repos("acme", &["c"]), repos("acme", &["d"])],
        );
        let enumerator = RepositoryEnumerator::new(&host, Logger::null());

        let all = enumerator.enumerate(&orgs(&["acme"]), &AcceptAll).unwrap();

        assert_eq!(names(&all), vec!["acme/a", "acme/b", "acme/c", "acme/d"]);
        let listed = host
            .calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::ListRepos { .. }))
            .count();
        assert_eq!(listed, 3);
    }

    #[test]
    fn test_preserves_organization_order() {
        let host = MockHost::new()
            .with_org("zeta", repos("zeta", &["z"]))
            .with_org("acme", repos("acme", &["a"]));
        let enumerator = RepositoryEnumerator::new(&host, Logger::null());

        let all = enumerator
            .enumerate(&orgs(&["zeta", "acme"]), &AcceptAll)
            .unwrap();

        assert_eq!(names(&all), vec!["zeta/z", "acme/a"]);
    }

    #[test]
    fn test_failure_on_later_page_aborts() {
        let host = MockHost::new()
            .with_org_pages("acme", vec![repos("acme", &["a"]), repos("acme", &["b"])])
            .failing("list", "acme#1");
        let enumerator = RepositoryEnumerator::new(&host, Logger::null());

        assert!(enumerator.enumerate(&orgs(&["acme"]), &AcceptAll).is_err());
    }

    #[test]
    fn test_failure_in_second_org_discards_first() {
        let host = MockHost::new().with_org("acme", repos("acme", &["a"]));
        let enumerator = RepositoryEnumerator::new(&host, Logger::null());

        let result = enumerator.enumerate(&orgs(&["acme", "missing"]), &AcceptAll);
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_filter_runs_after_full_retrieval() {
        let mut fork = Repository::new("acme/fork", "main");
        fork.fork = true;
        let host = MockHost::new().with_org_pages(
            "acme",
            vec![vec![fork], repos("acme", &["b"])],
        );
        let enumerator = RepositoryEnumerator::new(&host, Logger::null());

        let selected = enumerator.enumerate(&orgs(&["acme"]), &SkipForks).unwrap();

        assert_eq!(names(&selected), vec!["acme/b"]);
        // Filtering never shortens the traversal.
        assert_eq!(
            host.calls()
                .iter()
                .filter(|c| matches!(c, HostCall::ListRepos { .. }))
                .count(),
            2
        );
    }

    proptest! {
        #[test]
        fn prop_filtered_equals_filter_after_accept_all(
            sizes in prop::collection::vec(0usize..4, 1..5),
            forks in prop::collection::vec(any::<bool>(), 16),
        ) {
            let mut n = 0;
            let pages: Vec<Vec<Repository>> = sizes
                .iter()
                .map(|size| {
                    (0..*size)
                        .map(|_| {
                            let mut r = Repository::new(&format!("acme/r{}", n), "main");
                            r.fork = forks[n % forks.len()];
                            n += 1;
                            r
                        })
                        .collect()
                })
                .collect();
            let total: usize = sizes.iter().sum();
            let host = MockHost::new().with_org_pages("acme", pages);
            let enumerator = RepositoryEnumerator::new(&host, Logger::null());

            let all = enumerator.enumerate(&orgs(&["acme"]), &AcceptAll).unwrap();
            prop_assert_eq!(all.len(), total);

            let filtered = enumerator.enumerate(&orgs(&["acme"]), &SkipForks).unwrap();
            let expected: Vec<Repository> = all.into_iter().filter(|r| !r.fork).collect();
            prop_assert_eq!(filtered, expected);
        }
    }
}
