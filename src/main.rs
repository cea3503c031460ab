// ABOUTME: Entry point for the cohort CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use cohort::config::{self, Config};
use cohort::error::Result;
use cohort::output::{Output, OutputMode};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);
    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

/// Log filter when `RUST_LOG` is unset; verbosity never extends to dependencies.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "cohort=debug" } else { "cohort=info" }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let load = || load_config(cli.config.as_deref());

    match cli.command {
        Commands::Init { name, image, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, name.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Wrote {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy { skip_cleanup } => commands::deploy(load()?, skip_cleanup, output).await,
        Commands::Cleanup => commands::cleanup(load()?, output).await,
        Commands::Console => commands::console(load()?, output).await,
        Commands::Enter => commands::enter(load()?, output).await,
        Commands::Restart => commands::restart(load()?, output).await,
        Commands::Logs => commands::logs(load()?, output).await,
        Commands::Pull => commands::pull(load()?, output).await,
        Commands::Status => commands::status(load()?, output).await,
    }
}
