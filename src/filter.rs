//! # Repository Filters
//!
//! A [`RepositoryFilter`] decides which enumerated repositories make up the
//! working set. Filters see the hosting API as well as the descriptor, so a
//! filter may consult side information the listing does not carry.
//!
//! Filters are applied by [`crate::enumerate::RepositoryEnumerator`] only
//! after every page of every organization has been fetched.

use glob::Pattern;

use crate::error::Result;
use crate::hosting::HostingApi;
use crate::models::Repository;

/// Predicate over `(api, repository)`.
pub trait RepositoryFilter: Send + Sync {
    fn accept(&self, api: &dyn HostingApi, repo: &Repository) -> bool;
}

/// Accepts every repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RepositoryFilter for AcceptAll {
    fn accept(&self, _api: &dyn HostingApi, _repo: &Repository) -> bool {
        true
    }
}

/// Rejects forks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipForks;

impl RepositoryFilter for SkipForks {
    fn accept(&self, _api: &dyn HostingApi, repo: &Repository) -> bool {
        !repo.fork
    }
}

/// Accepts repositories carrying a given topic.
#[derive(Debug, Clone)]
pub struct HasTopic(pub String);

impl RepositoryFilter for HasTopic {
    fn accept(&self, _api: &dyn HostingApi, repo: &Repository) -> bool {
        repo.topics.iter().any(|t| t == &self.0)
    }
}

/// Include/exclude globs over `org/name`.
///
/// An empty include list accepts everything not excluded.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl NameFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(Into::into))
                .collect()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }
}

impl RepositoryFilter for NameFilter {
    fn accept(&self, _api: &dyn HostingApi, repo: &Repository) -> bool {
        let name = repo.full_name.as_str();
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }
}

/// Accepts a repository only when every inner filter does.
#[derive(Default)]
pub struct AllOf(Vec<Box<dyn RepositoryFilter>>);

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl RepositoryFilter + 'static) -> Self {
        self.0.push(Box::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl RepositoryFilter for AllOf {
    fn accept(&self, api: &dyn HostingApi, repo: &Repository) -> bool {
        self.0.iter().all(|f| f.accept(api, repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHost;

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.accept(&MockHost::new(), &Repository::new("acme/a", "main")));
    }

    #[test]
    fn test_skip_forks() {
        let mut repo = Repository::new("acme/a", "main");
        assert!(SkipForks.accept(&MockHost::new(), &repo));
        repo.fork = true;
        assert!(!SkipForks.accept(&MockHost::new(), &repo));
    }

    #[test]
    fn test_has_topic() {
        let mut repo = Repository::new("acme/a", "main");
        repo.topics = vec!["rust".to_string()];
        assert!(HasTopic("rust".to_string()).accept(&MockHost::new(), &repo));
        assert!(!HasTopic("go".to_string()).accept(&MockHost::new(), &repo));
    }

    #[test]
    fn test_name_filter_include_and_exclude() {
        let filter = NameFilter::new(
            &["acme/*-service".to_string()],
            &["acme/legacy-*".to_string()],
        )
        .unwrap();
        assert!(filter.accept(&MockHost::new(), &Repository::new("acme/billing-service", "main")));
        assert!(!filter.accept(&MockHost::new(), &Repository::new("acme/legacy-service", "main")));
        assert!(!filter.accept(&MockHost::new(), &Repository::new("acme/website", "main")));
    }

    #[test]
    fn test_name_filter_empty_include_accepts() {
        let filter = NameFilter::new(&[], &["acme/tmp*".to_string()]).unwrap();
        assert!(filter.accept(&MockHost::new(), &Repository::new("acme/website", "main")));
        assert!(!filter.accept(&MockHost::new(), &Repository::new("acme/tmp-1", "main")));
    }

    #[test]
    fn test_name_filter_invalid_pattern() {
        assert!(NameFilter::new(&["acme/[".to_string()], &[]).is_err());
    }

    #[test]
    fn test_all_of() {
        let filter = AllOf::new().with(SkipForks).with(HasTopic("rust".to_string()));
        let mut repo = Repository::new("acme/a", "main");
        repo.topics = vec!["rust".to_string()];
        assert!(filter.accept(&MockHost::new(), &repo));
        repo.fork = true;
        assert!(!filter.accept(&MockHost::new(), &repo));
        assert!(AllOf::new().accept(&MockHost::new(), &repo));
    }
}
