// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Rolling deploys of a containerized service across engine hosts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: cohort.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON lines output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template cohort.yml
    Init {
        /// Service name
        #[arg(long)]
        name: Option<String>,

        /// Image reference
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Roll the service out to every host, one at a time
    Deploy {
        /// Keep all stopped containers
        #[arg(long)]
        skip_cleanup: bool,
    },

    /// Remove old stopped containers on every host
    Cleanup,

    /// Start a console container and attach to it
    Console,

    /// Open a shell in the running container on the first host
    Enter,

    /// Restart the running container on every host
    Restart,

    /// Follow the logs of the running container on the first host
    Logs,

    /// Pull the image on every host
    Pull,

    /// Show running tags per host
    Status,
}
