//! CLI argument parsing and usage text.
//!
//! One version token, everything after it forwarded verbatim to the
//! assembler; the wrapper defines no flags of its own. Clap's built-in
//! help is disabled because `help`/`--help` must exit with code 1 and print
//! the image-specific usage text, including the cached release list.

use clap::Parser;

use crate::version::sort_tags_descending;

const USAGE_HEADER: &str = r#"
Usage:
    docker run -u `id -u`:`id -g` \
        -v `pwd`:/output \
        <DOCKER-IMAGE> \
        <SHASTA-VERSION-STRING> \
        --input input.fasta \
        --config <CONFIG>

    OR

    docker run --privileged \
        -v `pwd`:/output \
        <DOCKER-IMAGE> \
        <SHASTA-VERSION-STRING> \
        --input input.fasta \
        --config <CONFIG> \
        --memoryMode filesystem --memoryBacking 2M

    Accepted values for SHASTA-VERSION-STRING are:
        <RELEASE-TAG> : This will run a specified release, eg, 0.9.0.
        latest-commit : This will download and build the current main branch of chanzuckerberg/shasta
        <COMMIT-HASH> : This will download and build the main branch of chanzuckerberg/shasta at the given commit

    The available Shasta releases can be found at https://github.com/chanzuckerberg/shasta/releases.
    This image contains cached executables for the following <RELEASE-TAG> values:
"#;

const USAGE_FOOTER: &str = "
Shasta documentation can be found at https://chanzuckerberg.github.io/shasta/
";

/// Runner invocation: a version token plus verbatim assembler arguments.
#[derive(Parser, Debug)]
#[command(
    name = "shasta-runner",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Release tag, commit hash, or the literal `latest-commit`.
    #[arg(value_name = "SHASTA-VERSION-STRING")]
    pub version: String,

    /// Arguments forwarded verbatim to the assembler.
    #[arg(
        value_name = "ASSEMBLER-ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub assembler_args: Vec<String>,
}

/// `help` or `--help` anywhere in argv requests the usage text; the whole
/// argument list is checked, not just the version position.
pub fn wants_usage(argv: &[String]) -> bool {
    argv.is_empty() || argv.iter().any(|arg| arg == "help" || arg == "--help")
}

/// Render the usage text with the cached releases listed newest-first.
pub fn usage(cached_tags: &[String]) -> String {
    let mut tags = cached_tags.to_vec();
    sort_tags_descending(&mut tags);
    let listing = if tags.is_empty() {
        "       (none)".to_string()
    } else {
        tags.iter()
            .map(|tag| format!("       {tag:<14} : Shasta release {tag}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("{USAGE_HEADER}{listing}\n{USAGE_FOOTER}")
}
