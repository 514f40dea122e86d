//! CLI argument parsing

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "pwnbox")]
#[command(version, about = "Provision, connect to, update and tear down a PwnBox container", long_about = None)]
pub struct Args {
    /// What to do with the PwnBox container
    #[arg(value_enum)]
    pub command: Command,

    /// Print extra diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print the banner
    #[arg(short = 'b', long)]
    pub no_banner: bool,

    /// Skip the CLI and image update checks
    #[arg(short = 'n', long)]
    pub no_update: bool,

    /// Path to the config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Seconds to wait for SSH to become available
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Do not SSH into the container after `up`
    #[arg(short = 's', long)]
    pub no_ssh: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the container (pulling the image if needed) and log in
    Up,
    /// Stop and remove the container
    Down,
    /// Download or update the image
    Pull,
    /// Write a default config file
    Generate,
}
