use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use repopick::{cli, clipboard, workflow};

fn init_logging(cli_args: &cli::Cli) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli_args.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if cli_args.quiet {
        builder.filter_level(LevelFilter::Error);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> Result<()> {
    // The clipboard holder exits before any argument parsing.
    if clipboard::run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    init_logging(&cli_args);

    workflow::run_repopick(cli_args)
}
