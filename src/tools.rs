//! External tool invocations behind a capability trait.
//!
//! The resolver never spawns `git`, `cmake`, or `make` directly and never
//! issues its own HTTP requests; it goes through [`Toolchain`] so tests can
//! substitute a fake. [`SystemToolchain`] is the real implementation.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Outcome of a release-artifact download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    /// The artifact was written to the requested destination.
    Fetched,
    /// The store answered with a client error: the tag is not a published
    /// release. Not a failure; resolution moves on to the next strategy.
    NotARelease,
}

/// Capabilities the resolver needs from the outside world.
pub trait Toolchain {
    /// Verify the tools needed for a source build are present, before any
    /// network work happens on their behalf.
    fn check_build_tools(&self) -> Result<()> {
        Ok(())
    }

    /// Fetch `url` into `dest` and mark it executable.
    fn download(&self, url: &str, dest: &Path) -> Result<Download>;

    /// Clone `url` into the directory `dest` (which must not yet exist).
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Bring an existing checkout up to date with its remote head.
    fn pull_rebase(&self, repo: &Path) -> Result<()>;

    /// Full hash of the checkout's current head.
    fn rev_parse_head(&self, repo: &Path) -> Result<String>;

    /// Whether `rev` names an object in the checkout's history.
    fn commit_exists(&self, repo: &Path, rev: &str) -> Result<bool>;

    /// Check out `rev` in the given repository.
    fn checkout(&self, repo: &Path, rev: &str) -> Result<()>;

    /// Configure a static build of `source` inside `build_dir`.
    fn configure(&self, source: &Path, build_dir: &Path) -> Result<()>;

    /// Compile and install the configured tree under `build_dir`.
    fn build_install(&self, build_dir: &Path) -> Result<()>;
}

/// Production toolchain: `git`/`cmake`/`make` subprocesses plus an HTTP
/// client for release downloads.
pub struct SystemToolchain;

impl SystemToolchain {
    fn git(&self, repo: &Path, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(repo)
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            return Err(anyhow!("git {} failed with status {status}", args.join(" ")));
        }
        Ok(())
    }

    fn git_output(&self, repo: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed with status {}",
                args.join(" "),
                output.status
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Toolchain for SystemToolchain {
    fn check_build_tools(&self) -> Result<()> {
        for tool in ["git", "cmake", "make"] {
            which::which(tool)
                .with_context(|| format!("{tool} is required to build from source"))?;
        }
        Ok(())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<Download> {
        let mut response = match ureq::get(url).call() {
            Ok(response) => response,
            // 4xx from the artifact store means the tag is not a release.
            Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => {
                tracing::debug!(url, code, "tag is not a published release");
                return Ok(Download::NotARelease);
            }
            Err(err) => return Err(anyhow!(err)).context(format!("download {url}")),
        };
        let mut file =
            File::create(dest).with_context(|| format!("create {}", dest.display()))?;
        io::copy(&mut response.body_mut().as_reader(), &mut file)
            .with_context(|| format!("write {}", dest.display()))?;
        let mut permissions = file
            .metadata()
            .with_context(|| format!("stat {}", dest.display()))?
            .permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(dest, permissions)
            .with_context(|| format!("mark {} executable", dest.display()))?;
        Ok(Download::Fetched)
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let parent = dest
            .parent()
            .ok_or_else(|| anyhow!("clone destination {} has no parent", dest.display()))?;
        let status = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(dest)
            .current_dir(parent)
            .status()
            .context("spawn git clone")?;
        if !status.success() {
            return Err(anyhow!("git clone {url} failed with status {status}"));
        }
        Ok(())
    }

    fn pull_rebase(&self, repo: &Path) -> Result<()> {
        self.git(repo, &["pull", "--rebase"])
    }

    fn rev_parse_head(&self, repo: &Path) -> Result<String> {
        self.git_output(repo, &["rev-parse", "HEAD"])
    }

    fn commit_exists(&self, repo: &Path, rev: &str) -> Result<bool> {
        // Nonzero here means "no such object", which the resolver reports as
        // an invalid commit rather than a tool failure.
        let status = Command::new("git")
            .args(["cat-file", "-t", rev])
            .current_dir(repo)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("spawn git cat-file")?;
        Ok(status.success())
    }

    fn checkout(&self, repo: &Path, rev: &str) -> Result<()> {
        self.git(repo, &["checkout", rev])
    }

    fn configure(&self, source: &Path, build_dir: &Path) -> Result<()> {
        // Static binary, no embedded http server: matches the published
        // release artifacts.
        let status = Command::new("cmake")
            .arg(source)
            .args([
                "-DBUILD_DYNAMIC_LIBRARY=OFF",
                "-DBUILD_DYNAMIC_EXECUTABLE=OFF",
                "-DBUILD_WITH_HTTP_SERVER=OFF",
            ])
            .current_dir(build_dir)
            .status()
            .context("spawn cmake")?;
        if !status.success() {
            return Err(anyhow!("cmake configuration failed with status {status}"));
        }
        Ok(())
    }

    fn build_install(&self, build_dir: &Path) -> Result<()> {
        let status = Command::new("make")
            .args(["install/strip", "-j"])
            .current_dir(build_dir)
            .status()
            .context("spawn make")?;
        if !status.success() {
            return Err(anyhow!("make install/strip failed with status {status}"));
        }
        Ok(())
    }
}
