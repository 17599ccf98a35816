//! Shared test infrastructure for integration tests.
//!
//! Each fixture gets its own installation directory and working directory so
//! tests never touch `/opt` or the real network: every version token used in
//! integration tests must already be cached in the fixture's install dir.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const LOG_FILE_NAME: &str = "shasta_assembly.log";

/// Isolated runner fixture with a private cache and working directory.
pub struct Fixture {
    pub install_dir: TempDir,
    pub work_dir: TempDir,
    scratch_dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        Self {
            install_dir: TempDir::new().expect("create install dir"),
            work_dir: TempDir::new().expect("create work dir"),
            scratch_dir: TempDir::new().expect("create scratch dir"),
        }
    }

    /// Install a fake assembler for `tag`: a shell script cached under the
    /// release naming convention.
    pub fn cache_release(&self, tag: &str, script: &str) -> PathBuf {
        let path = self.install_dir.path().join(format!("shasta-Linux-{tag}"));
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write fake assembler");
        let mut permissions = fs::metadata(&path).expect("stat fake assembler").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("chmod fake assembler");
        path
    }

    /// Run the wrapper binary with the fixture's directories.
    pub fn invoke(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_shasta-runner"))
            .args(args)
            .current_dir(self.work_dir.path())
            .env("SHASTA_RUNNER_INSTALL_DIR", self.install_dir.path())
            .env("SHASTA_RUNNER_SCRATCH_DIR", self.scratch_dir.path())
            .output()
            .expect("spawn shasta-runner")
    }

    pub fn log_path(&self) -> PathBuf {
        self.work_dir.path().join(LOG_FILE_NAME)
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_path()).expect("read run log")
    }

    pub fn work_path(&self, relative: &str) -> PathBuf {
        self.work_dir.path().join(relative)
    }
}

#[allow(dead_code)]
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[allow(dead_code)]
pub fn exists(path: &Path) -> bool {
    path.exists()
}
