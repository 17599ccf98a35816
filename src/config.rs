//! Runtime configuration for the runner.
//!
//! Defaults match the layout of the published Docker image: cached release
//! binaries live in `/opt`, downloads and source builds go to `/tmp`. Both
//! directories can be relocated through environment variables so the runner
//! works outside the image.

use std::env;
use std::path::PathBuf;

/// Name prefix shared by every cached or downloaded assembler binary.
/// The release tag is appended as a suffix, e.g. `shasta-Linux-0.11.1`.
pub const BINARY_PREFIX: &str = "shasta-Linux-";

/// Fixed name of the combined stdout/stderr log written next to the run.
pub const LOG_FILE_NAME: &str = "shasta_assembly.log";

/// Output directory the assembler creates when `--assemblyDirectory` is not
/// passed. The runner copies the log there after the run.
pub const DEFAULT_ASSEMBLY_DIR: &str = "ShastaRun";

/// Token that selects a build of the current upstream head.
pub const LATEST_COMMIT: &str = "latest-commit";

const DEFAULT_INSTALL_DIR: &str = "/opt";
const DEFAULT_SCRATCH_DIR: &str = "/tmp";
const DEFAULT_REPO_URL: &str = "https://github.com/chanzuckerberg/shasta.git";
const DEFAULT_RELEASE_URL_BASE: &str =
    "https://github.com/chanzuckerberg/shasta/releases/download";

/// Paths and URLs used during resolution, threaded explicitly through the
/// resolver instead of relying on process-wide directory changes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for cached release binaries.
    pub install_dir: PathBuf,
    /// Directory receiving downloads, the source checkout, and the build tree.
    pub scratch_dir: PathBuf,
    /// Upstream source repository cloned for commit builds.
    pub repo_url: String,
    /// Base URL of the release artifact store; `<base>/<tag>/<prefix><tag>`
    /// names a published binary.
    pub release_url_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            repo_url: DEFAULT_REPO_URL.to_string(),
            release_url_base: DEFAULT_RELEASE_URL_BASE.to_string(),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to image defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env::var_os("SHASTA_RUNNER_INSTALL_DIR") {
            config.install_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env::var_os("SHASTA_RUNNER_SCRATCH_DIR") {
            config.scratch_dir = PathBuf::from(dir);
        }
        config
    }

    /// Download URL for a release tag, following the upstream naming
    /// convention for prebuilt binaries.
    pub fn release_url(&self, tag: &str) -> String {
        format!("{}/{tag}/{BINARY_PREFIX}{tag}", self.release_url_base)
    }
}
