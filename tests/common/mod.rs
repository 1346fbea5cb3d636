//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::ACME);
//!     fixture.command().arg("list").assert().failure();
//! }
//! ```

use assert_fs::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server, StatusCode};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{git, git_available, FakeApi};
    pub use super::TestFixture;
}

/// Configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// One organization, defaults for everything else.
    pub const ACME: &str = "organizations: [acme]\n";

    /// Only MIT is allowed.
    pub const MIT_ONLY: &str = "organizations: [acme]\nallowed_licenses: [MIT]\n";

    /// Misspelled key.
    pub const UNKNOWN_FIELD: &str = "orgz: [acme]\n";
}

/// Environment variables that would leak the developer's setup into tests.
const ISOLATED_ENV: &[&str] = &[
    "GITHUB_TOKEN",
    "REPO_FLEET_ORGS",
    "REPO_FLEET_DIR",
    "REPO_FLEET_API_URL",
    "RUST_LOG",
];

/// A temporary working directory with an optional `.repo-fleet.yaml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".repo-fleet.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory with a clean environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-fleet");
        cmd.current_dir(self.path());
        for var in ISOLATED_ENV {
            cmd.env_remove(var);
        }
        cmd.arg("--color").arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One canned reply: status, extra headers, JSON body.
pub type Canned = (u16, Vec<(String, String)>, String);

/// A local HTTP server answering requests with canned JSON replies, in order.
pub struct FakeApi {
    pub base: String,
    handle: thread::JoinHandle<Vec<String>>,
}

impl FakeApi {
    pub fn serve(responses: Vec<(u16, String)>) -> Self {
        Self::serve_with(move |_| {
            responses
                .into_iter()
                .map(|(status, body)| (status, Vec::new(), body))
                .collect()
        })
    }

    /// Like [`FakeApi::serve`], but `build` receives the base URL so replies
    /// can point back at the server, e.g. in `Link` headers.
    pub fn serve_with(build: impl FnOnce(&str) -> Vec<Canned>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("http server");
        let base = format!("http://{}/", server.server_addr());
        let responses = build(&base);
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, headers, body) in responses {
                let mut request = match server.recv_timeout(Duration::from_secs(10)) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };
                let mut body_in = String::new();
                let _ = request.as_reader().read_to_string(&mut body_in);
                seen.push(format!("{} {}", request.method(), request.url()));

                let mut response = Response::from_data(body.into_bytes())
                    .with_status_code(StatusCode(status))
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("content-type header"),
                    );
                for (name, value) in headers {
                    response = response.with_header(
                        Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("header"),
                    );
                }
                let _ = request.respond(response);
            }
            seen
        });
        Self { base, handle }
    }

    /// `METHOD /path?query` of every request served, once the canned replies
    /// are used up or the server gave up waiting.
    pub fn requests(self) -> Vec<String> {
        self.handle.join().expect("server thread panicked")
    }
}

/// Repository JSON as returned by the organization listing.
#[allow(dead_code)]
pub fn repo_json(name: &str, extra: &str) -> String {
    format!(
        r#"{{"name":"{0}","full_name":"acme/{0}","default_branch":"main","clone_url":"https://example.invalid/acme/{0}.git"{1}}}"#,
        name, extra
    )
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Runs `git` in `dir` with a fixed identity and panics on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Creates a bare remote at `root/remote.git` whose `main` holds one commit
/// with `README.md`, and returns its path.
#[allow(dead_code)]
pub fn bare_remote(root: &Path) -> PathBuf {
    let seed = root.join("seed");
    std::fs::create_dir_all(&seed).expect("create seed dir");
    git(&seed, &["init", "-q", "-b", "main"]);
    std::fs::write(seed.join("README.md"), "hello\n").expect("write README");
    git(&seed, &["add", "README.md"]);
    git(&seed, &["commit", "-q", "-m", "initial"]);

    let remote = root.join("remote.git");
    git(
        root,
        &["clone", "-q", "--bare", seed.to_str().expect("utf-8 path"), "remote.git"],
    );
    remote
}

/// Adds a commit to `remote` through a scratch clone.
#[allow(dead_code)]
pub fn push_commit(root: &Path, remote: &Path, file: &str, content: &str) {
    let scratch = root.join(format!("scratch-{}", file.replace('/', "_")));
    git(
        root,
        &[
            "clone",
            "-q",
            remote.to_str().expect("utf-8 path"),
            scratch.to_str().expect("utf-8 path"),
        ],
    );
    std::fs::write(scratch.join(file), content).expect("write file");
    git(&scratch, &["add", file]);
    git(&scratch, &["commit", "-q", "-m", "update"]);
    git(&scratch, &["push", "-q", "origin", "main"]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config(configs::ACME);
        assert!(fixture.path().join(".repo-fleet.yaml").exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::ACME, configs::MIT_ONLY, configs::UNKNOWN_FIELD] {
            assert!(serde_yaml::from_str::<serde_yaml::Value>(config).is_ok());
        }
    }
}
