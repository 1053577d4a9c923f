use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::format::TargetFormat;
use crate::task::GeneratorKind;

/// repopick – browse a GitHub repository and pick source files for a generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository as owner/name[@branch]. Defaults to the last one browsed.
    #[arg(value_name = "REPOSITORY")]
    pub repository: Option<String>,

    /// Format to highlight: JSON, XML, CSV, YAML, DataWeave or RAML (or an extension).
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<TargetFormat>,

    /// Generator the picked file is for (data-weave, integration, diagram, sample-data, munit).
    /// Also selects a default format.
    #[arg(short, long, value_name = "GENERATOR")]
    pub generator: Option<GeneratorKind>,

    /// Print the entries under CURSOR ("/" when omitted) and exit without the TUI.
    #[arg(long, value_name = "CURSOR", num_args = 0..=1, default_missing_value = "/")]
    pub list: Option<String>,

    /// Glob of repository paths to fetch without the TUI (e.g. "src/**/*.dwl").
    /// Can be given multiple times.
    #[arg(long, value_name = "GLOB")]
    pub pick: Vec<String>,

    /// Restrict --list and --pick to files matching the target format.
    #[arg(long)]
    pub matching_only: bool,

    /// What to produce for the picked files.
    #[arg(long, value_enum, default_value_t = Emit::Text)]
    pub emit: Emit,

    /// Print the output instead of copying it to the clipboard.
    #[arg(long)]
    pub dry_run: bool,

    /// GitHub access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub API (for GitHub Enterprise).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Directory tree followed by each file's content.
    Text,
    /// One generator task record per file, as JSON.
    Task,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_headless_invocation() {
        let cli = Cli::try_parse_from([
            "repopick",
            "acme/flows@develop",
            "--format",
            "dwl",
            "--pick",
            "src/**/*.dwl",
            "--pick",
            "test/*.dwl",
            "--emit",
            "task",
            "-g",
            "data-weave",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.repository.as_deref(), Some("acme/flows@develop"));
        assert_eq!(cli.format, Some(TargetFormat::DataWeave));
        assert_eq!(cli.generator, Some(GeneratorKind::DataWeave));
        assert_eq!(cli.pick.len(), 2);
        assert_eq!(cli.emit, Emit::Task);
        assert!(cli.dry_run);
    }

    #[test]
    fn list_defaults_to_root() {
        let cli = Cli::try_parse_from(["repopick", "acme/flows", "--list"]).unwrap();
        assert_eq!(cli.list.as_deref(), Some("/"));
        let cli = Cli::try_parse_from(["repopick", "acme/flows", "--list", "src"]).unwrap();
        assert_eq!(cli.list.as_deref(), Some("src"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["repopick", "--format", "cobol"]).is_err());
    }
}
