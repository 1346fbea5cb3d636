//! # repo-fleet
//!
//! Bulk, idempotent operations across every repository of one or more
//! code-hosting organizations. The library backs the `repo-fleet`
//! command-line tool and can be embedded elsewhere.
//!
//! ## Quick Example
//!
//! ```
//! use repo_fleet::enumerate::RepositoryEnumerator;
//! use repo_fleet::filter::SkipForks;
//! use repo_fleet::logging::Logger;
//! use repo_fleet::models::Repository;
//! use repo_fleet::testing::MockHost;
//!
//! let mut fork = Repository::new("acme/fork", "main");
//! fork.fork = true;
//! let host = MockHost::new().with_org("acme", vec![Repository::new("acme/app", "main"), fork]);
//!
//! let repos = RepositoryEnumerator::new(&host, Logger::null())
//!     .enumerate(&["acme".to_string()], &SkipForks)
//!     .unwrap();
//! assert_eq!(repos.len(), 1);
//! assert_eq!(repos[0].full_name, "acme/app");
//! ```
//!
//! ## Core Concepts
//!
//! - **Hosting API (`hosting`, `github`)**: the [`hosting::HostingApi`] trait
//!   is the seam to the remote service; [`github::GitHubClient`] implements it
//!   over the GitHub REST API.
//! - **Working set (`enumerate`, `filter`)**: every operation starts from the
//!   complete, paginated repository listing of the configured organizations,
//!   narrowed by composable filters.
//! - **Remote operations (`deploy`, `mailmap`)**: push a file to every
//!   repository through a fresh branch and a pull request, or merge and
//!   redistribute the `.mailmap`.
//! - **Local operations (`local_sync`, `git`)**: clone or update a local copy
//!   of every repository using the system `git`.
//! - **Reports (`license`, `pulls`)**: read-only audits over the working set.
//! - **Batches (`batch`)**: per-repository fan-out with failure isolation,
//!   optional parallelism and cancellation.

pub mod batch;
pub mod config;
pub mod defaults;
pub mod deploy;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod git;
pub mod github;
pub mod hosting;
pub mod license;
pub mod local_sync;
pub mod logging;
pub mod mailmap;
pub mod models;
pub mod output;
pub mod pagination;
pub mod pulls;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
