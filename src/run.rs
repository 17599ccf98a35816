//! Assembler invocation and log placement.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::config::{DEFAULT_ASSEMBLY_DIR, LOG_FILE_NAME};

/// Output directory named by `--assemblyDirectory`, or the assembler's
/// default when the flag is absent. The flag is inspected, not consumed; the
/// assembler still receives it.
pub fn assembly_directory(args: &[String]) -> &str {
    args.windows(2)
        .find(|pair| pair[0] == "--assemblyDirectory")
        .map(|pair| pair[1].as_str())
        .unwrap_or(DEFAULT_ASSEMBLY_DIR)
}

/// Run the resolved executable with `args` forwarded verbatim.
///
/// Stdout and stderr are merged, order-preserving, into the fixed log file in
/// `work_dir` (truncated on every run). After the child exits the log is
/// copied into the assembly directory, which is created if missing. Blocks
/// without a timeout; assemblies may run for hours.
pub fn run(executable: &Path, args: &[String], work_dir: &Path) -> Result<ExitStatus> {
    println!("\n\nUsing {} Shasta executable.", executable.display());
    println!(
        "\nRunning Shasta assembly. You can follow along by running `tail -f {LOG_FILE_NAME}` in the output directory.\n...\n"
    );
    std::io::stdout().flush().ok();

    let log_path = work_dir.join(LOG_FILE_NAME);
    let log = File::create(&log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    let log_for_stderr = log.try_clone().context("clone log handle")?;

    let status = Command::new(executable)
        .args(args)
        .current_dir(work_dir)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_for_stderr))
        .status()
        .with_context(|| format!("spawn {}", executable.display()))?;

    tracing::info!(code = ?status.code(), "assembler exited");
    copy_log(&log_path, &resolve_output_dir(work_dir, assembly_directory(args)))?;

    println!("\n\nDone. Check the assembly directory for results.");
    std::io::stdout().flush().ok();
    Ok(status)
}

fn resolve_output_dir(work_dir: &Path, assembly_dir: &str) -> PathBuf {
    let assembly_dir = Path::new(assembly_dir);
    if assembly_dir.is_absolute() {
        assembly_dir.to_path_buf()
    } else {
        work_dir.join(assembly_dir)
    }
}

fn copy_log(log_path: &Path, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create assembly directory {}", output_dir.display()))?;
    fs::copy(log_path, output_dir.join(LOG_FILE_NAME))
        .with_context(|| format!("copy log into {}", output_dir.display()))?;
    Ok(())
}
