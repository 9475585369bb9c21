use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::control::{ControlAction, ControlTarget};

#[derive(Parser)]
#[command(name = "unraid-mirror")]
#[command(version)]
#[command(about = "Mirror an Unraid server's state into a local object tree", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/unraid-mirror/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key, overrides the config file
    #[arg(long, env = "UNRAID_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Categories to mirror (comma-separated), overrides the config file
    #[arg(long, value_delimiter = ',', global = true)]
    pub categories: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll continuously until stopped ('p' + Enter polls now, 'q' quits)
    Run,

    /// Run a single poll cycle and print a summary
    Once,

    /// Print the query the current selection composes to
    Query,

    /// List the categories that can be mirrored
    Categories,

    /// Show the mirrored object tree from the state file
    Status {
        /// Only show nodes within this id (e.g. docker.containers)
        prefix: Option<String>,
    },

    /// Start, stop or otherwise control a container or VM, then re-poll
    Control {
        #[arg(value_enum)]
        target: ControlTarget,

        #[arg(value_enum)]
        action: ControlAction,

        /// Server-side id of the container or VM
        id: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
