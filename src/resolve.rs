//! Version resolution: cache lookup, release download, source build.
//!
//! Exactly one executable is resolved per invocation. The three strategies
//! are mutually exclusive and tried in a fixed order: local cache, then the
//! release artifact store, then a source build of the requested commit.

use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache;
use crate::config::{Config, BINARY_PREFIX, LATEST_COMMIT};
use crate::tools::{Download, Toolchain};
use crate::version::is_release_tag;

/// Fatal resolution failures. All of them terminate the run with exit code 2.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The token is shaped like a release tag but is neither cached nor
    /// published. Release tags are never built from source.
    #[error("Shasta version {0} is not available on this platform. Run the command with `--help` to see available options.")]
    VersionUnavailable(String),

    /// The token does not name a commit in the upstream history.
    #[error("{0} is not a valid git commit hash.")]
    InvalidCommit(String),

    /// Clone, pull, or download failed for a reason other than "not found".
    #[error("network failure: {0:#}")]
    Network(#[source] anyhow::Error),

    /// Configure or compile step failed.
    #[error("build failure: {0:#}")]
    Build(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Resolve a version token to an executable path.
///
/// `latest-commit` is resolved against the head of the freshly updated
/// checkout every time; an older local build never satisfies it.
pub fn resolve(
    token: &str,
    config: &Config,
    tools: &dyn Toolchain,
) -> Result<PathBuf, ResolveError> {
    let releases = cache::available_releases(&config.install_dir)?;
    if let Some(path) = releases.get(token) {
        tracing::info!(token, path = %path.display(), "resolved from local cache");
        return Ok(path.clone());
    }

    let url = config.release_url(token);
    let dest = config.scratch_dir.join(format!("{BINARY_PREFIX}{token}"));
    match tools.download(&url, &dest) {
        Ok(Download::Fetched) => {
            tracing::info!(token, path = %dest.display(), "downloaded release binary");
            return Ok(dest);
        }
        Ok(Download::NotARelease) => {}
        Err(err) => return Err(ResolveError::Network(err)),
    }

    if is_release_tag(token) {
        // A labeled release that is neither cached nor published is rejected
        // rather than silently rebuilt from whatever source is reachable.
        return Err(ResolveError::VersionUnavailable(token.to_string()));
    }

    build_from_source(token, config, tools)
}

fn build_from_source(
    token: &str,
    config: &Config,
    tools: &dyn Toolchain,
) -> Result<PathBuf, ResolveError> {
    tools.check_build_tools()?;

    progress("Downloading and building Shasta code at the requested commit.");

    let repo = config.scratch_dir.join("shasta");
    let build_dir = config.scratch_dir.join("shasta-build");

    if !repo.exists() {
        tools
            .clone_repo(&config.repo_url, &repo)
            .map_err(ResolveError::Network)?;
    }
    tools.pull_rebase(&repo).map_err(|err| {
        ResolveError::Network(err.context("\"git pull --rebase\" failed. Internet access is required."))
    })?;

    let rev = if token == LATEST_COMMIT {
        tools.rev_parse_head(&repo).map_err(ResolveError::Network)?
    } else if tools.commit_exists(&repo, token)? {
        token.to_string()
    } else {
        return Err(ResolveError::InvalidCommit(token.to_string()));
    };

    progress(&format!("Building Shasta at commit - {rev}"));
    tools.checkout(&repo, &rev).context("check out revision")?;

    fs::create_dir_all(&build_dir)
        .with_context(|| format!("create build dir {}", build_dir.display()))?;

    progress("Configuring & Building Shasta ...");
    tools
        .configure(&repo, &build_dir)
        .map_err(ResolveError::Build)?;
    tools
        .build_install(&build_dir)
        .map_err(ResolveError::Build)?;
    progress("Done building Shasta");

    Ok(build_dir.join("shasta-install").join("bin").join("shasta"))
}

/// Print a progress line and flush, so it interleaves correctly with a
/// concurrently tailed log.
fn progress(line: &str) {
    println!("{line}");
    let _ = std::io::stdout().flush();
}
