//! Deployment wrapper for the Shasta assembler.
//!
//! Resolves a version token to an executable (cached release, downloaded
//! release artifact, or source build of a commit), runs it with the remaining
//! arguments forwarded verbatim, and places the combined log in the assembly
//! directory.

use clap::Parser;
use std::env;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cache;
mod cli;
mod config;
mod resolve;
mod run;
mod tools;
mod version;

use cli::Cli;
use config::Config;
use resolve::ResolveError;
use tools::SystemToolchain;

const EXIT_USAGE: u8 = 1;
const EXIT_RESOLUTION_FAILURE: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    let config = Config::from_env();

    let argv: Vec<String> = env::args().skip(1).collect();
    if cli::wants_usage(&argv) {
        print_usage(&config);
        return ExitCode::from(EXIT_USAGE);
    }

    let cli = Cli::parse_from(env::args());
    dispatch(&cli, &config)
}

fn dispatch(cli: &Cli, config: &Config) -> ExitCode {
    println!("Shasta Version : {}", cli.version);
    std::io::stdout().flush().ok();

    let tools = SystemToolchain;
    let executable = match resolve::resolve(&cli.version, config, &tools) {
        Ok(executable) => executable,
        Err(err) => {
            eprintln!("{err}");
            if matches!(err, ResolveError::InvalidCommit(_)) {
                print_usage(config);
            }
            return ExitCode::from(EXIT_RESOLUTION_FAILURE);
        }
    };

    let work_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("cannot determine working directory: {err}");
            return ExitCode::from(EXIT_RESOLUTION_FAILURE);
        }
    };

    match run::run(&executable, &cli.assembler_args, &work_dir) {
        // The assembler's own exit status is the runner's exit status.
        Ok(status) => match status.code() {
            Some(code) => ExitCode::from(u8::try_from(code.clamp(0, 255)).unwrap_or(1)),
            None => {
                eprintln!("Shasta was terminated by a signal.");
                ExitCode::from(EXIT_RESOLUTION_FAILURE)
            }
        },
        Err(err) => {
            eprintln!("failed to run Shasta: {err:#}");
            ExitCode::from(EXIT_RESOLUTION_FAILURE)
        }
    }
}

fn print_usage(config: &Config) {
    let tags: Vec<String> = cache::available_releases(&config.install_dir)
        .map(|releases| releases.into_keys().collect())
        .unwrap_or_default();
    println!("{}", cli::usage(&tags));
    std::io::stdout().flush().ok();
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SHASTA_RUNNER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
