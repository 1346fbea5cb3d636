//! License audit over the working set.
//!
//! Only public, non-archived repositories are audited. Each one is
//! classified as licensed-and-allowed, licensed-but-disallowed, or
//! unlicensed; the latter two are logged as errors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::logging::Logger;
use crate::models::Repository;

/// Literal that allows every license.
pub const ALL: &str = ":all";

/// Which license identifiers are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedLicenses {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl AllowedLicenses {
    /// Builds the set from identifiers; `:all` anywhere allows everything.
    ///
    /// An empty slice allows nothing. Parsing and deserialization reject an
    /// empty list before it gets here.
    pub fn from_list<S: AsRef<str>>(items: &[S]) -> Self {
        if items.iter().any(|s| s.as_ref() == ALL) {
            return AllowedLicenses::All;
        }
        AllowedLicenses::Only(items.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn allows(&self, identifier: &str) -> bool {
        match self {
            AllowedLicenses::All => true,
            AllowedLicenses::Only(set) => set.contains(identifier),
        }
    }
}

impl FromStr for AllowedLicenses {
    type Err = Error;

    /// Comma-separated identifiers, or `:all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            return Err(empty_list());
        }
        Ok(Self::from_list(&items))
    }
}

fn empty_list() -> Error {
    Error::ConfigParse {
        message: "allowed licenses list is empty".to_string(),
        hint: Some(format!("use `{}` to allow every license", ALL)),
    }
}

impl<'de> Deserialize<'de> for AllowedLicenses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }
        match Raw::deserialize(deserializer)? {
            Raw::One(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Many(items) if items.is_empty() => {
                Err(serde::de::Error::custom(empty_list()))
            }
            Raw::Many(items) => Ok(Self::from_list(&items)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseStatus {
    Allowed(String),
    Disallowed(String),
    Missing,
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseStatus::Allowed(id) => write!(f, "{} (allowed)", id),
            LicenseStatus::Disallowed(id) => write!(f, "{} (not allowed)", id),
            LicenseStatus::Missing => write!(f, "no license"),
        }
    }
}

#[derive(Debug, Default)]
pub struct LicenseReport {
    pub entries: Vec<(String, LicenseStatus)>,
}

impl LicenseReport {
    pub fn allowed(&self) -> usize {
        self.count(|s| matches!(s, LicenseStatus::Allowed(_)))
    }

    pub fn disallowed(&self) -> usize {
        self.count(|s| matches!(s, LicenseStatus::Disallowed(_)))
    }

    pub fn missing(&self) -> usize {
        self.count(|s| matches!(s, LicenseStatus::Missing))
    }

    pub fn has_problems(&self) -> bool {
        self.disallowed() + self.missing() > 0
    }

    fn count(&self, pred: impl Fn(&LicenseStatus) -> bool) -> usize {
        self.entries.iter().filter(|(_, s)| pred(s)).count()
    }
}

pub struct LicenseAuditor {
    allowed: AllowedLicenses,
    logger: Logger,
}

impl LicenseAuditor {
    pub fn new(allowed: AllowedLicenses, logger: Logger) -> Self {
        Self { allowed, logger }
    }

    /// `None` for repositories outside the audit (private or archived).
    pub fn classify(&self, repo: &Repository) -> Option<LicenseStatus> {
        if repo.private || repo.archived {
            return None;
        }
        Some(match &repo.license {
            None => LicenseStatus::Missing,
            Some(license) => {
                let id = license.identifier().to_string();
                if self.allowed.allows(&id) {
                    LicenseStatus::Allowed(id)
                } else {
                    LicenseStatus::Disallowed(id)
                }
            }
        })
    }

    pub fn audit(&self, repos: &[Repository]) -> LicenseReport {
        let mut report = LicenseReport::default();
        for repo in repos {
            let Some(status) = self.classify(repo) else {
                continue;
            };
            match &status {
                LicenseStatus::Allowed(id) => self
                    .logger
                    .info(format_args!("{}: {}", repo.full_name, id)),
                LicenseStatus::Disallowed(id) => self.logger.error(format_args!(
                    "{}: license {} is not allowed",
                    repo.full_name, id
                )),
                LicenseStatus::Missing => self
                    .logger
                    .error(format_args!("{}: missing license", repo.full_name)),
            }
            report.entries.push((repo.full_name.clone(), status));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use crate::models::License;
    use std::sync::Arc;

    fn licensed(name: &str, spdx: &str) -> Repository {
        let mut repo = Repository::new(name, "main");
        repo.license = Some(License {
            key: spdx.to_lowercase(),
            spdx_id: Some(spdx.to_string()),
            name: None,
        });
        repo
    }

    #[test]
    fn test_classification() {
        let auditor = LicenseAuditor::new(
            AllowedLicenses::from_list(&["MIT", "Apache-2.0"]),
            Logger::null(),
        );
        assert_eq!(
            auditor.classify(&licensed("acme/a", "MIT")),
            Some(LicenseStatus::Allowed("MIT".to_string()))
        );
        assert_eq!(
            auditor.classify(&licensed("acme/b", "GPL-3.0")),
            Some(LicenseStatus::Disallowed("GPL-3.0".to_string()))
        );
        assert_eq!(
            auditor.classify(&Repository::new("acme/c", "main")),
            Some(LicenseStatus::Missing)
        );
    }

    #[test]
    fn test_all_short_circuits_disallowed_check() {
        let auditor = LicenseAuditor::new("MIT, :all".parse().unwrap(), Logger::null());
        assert_eq!(
            auditor.classify(&licensed("acme/b", "WTFPL")),
            Some(LicenseStatus::Allowed("WTFPL".to_string()))
        );
    }

    #[test]
    fn test_private_and_archived_are_not_audited() {
        let auditor = LicenseAuditor::new(AllowedLicenses::All, Logger::null());
        let mut private = Repository::new("acme/secret", "main");
        private.private = true;
        let mut archived = Repository::new("acme/old", "main");
        archived.archived = true;
        assert_eq!(auditor.classify(&private), None);
        assert_eq!(auditor.classify(&archived), None);
    }

    #[test]
    fn test_audit_logs_problems_as_errors() {
        let sink = Arc::new(MemoryLog::default());
        let auditor = LicenseAuditor::new(
            AllowedLicenses::from_list(&["MIT"]),
            Logger::new(sink.clone()),
        );
        let repos = vec![
            licensed("acme/a", "MIT"),
            licensed("acme/b", "GPL-3.0"),
            Repository::new("acme/c", "main"),
        ];

        let report = auditor.audit(&repos);

        assert_eq!(report.allowed(), 1);
        assert_eq!(report.disallowed(), 1);
        assert_eq!(report.missing(), 1);
        assert!(report.has_problems());
        assert!(sink.contains(log::Level::Error, "acme/b: license GPL-3.0 is not allowed"));
        assert!(sink.contains(log::Level::Error, "acme/c: missing license"));
        assert_eq!(sink.count(log::Level::Error), 2);
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        assert!(" , ".parse::<AllowedLicenses>().is_err());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let all: AllowedLicenses = serde_yaml::from_str("':all'").unwrap();
        assert_eq!(all, AllowedLicenses::All);
        let some: AllowedLicenses = serde_yaml::from_str("[MIT, Apache-2.0]").unwrap();
        assert!(some.allows("Apache-2.0"));
        assert!(!some.allows("GPL-3.0"));
    }

    #[test]
    fn test_deserialize_rejects_empty_list() {
        let err = serde_yaml::from_str::<AllowedLicenses>("[]").unwrap_err();
        assert!(err.to_string().contains("allowed licenses list is empty"));
        assert!(serde_yaml::from_str::<AllowedLicenses>("''").is_err());
    }

    #[test]
    fn test_empty_slice_allows_nothing() {
        let none = AllowedLicenses::from_list::<&str>(&[]);
        assert!(!none.allows("MIT"));
    }
}
