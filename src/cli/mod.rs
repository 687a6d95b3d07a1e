//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod harvest;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use placereviews::config::Config;

#[derive(Parser)]
#[command(name = "placereviews")]
#[command(about = "Harvest reviews from a place page into JSON snapshots")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest all reviews of one place
    Harvest {
        /// Place URL or share link
        url: String,
        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Use the URL as given instead of following redirects
        #[arg(long)]
        no_resolve: bool,
        /// Show the browser window
        #[arg(long)]
        headful: bool,
        /// Print every harvested review
        #[arg(short, long)]
        print: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            url,
            output,
            no_resolve,
            headful,
            print,
        } => {
            let mut config = Config::load(cli.config.as_deref()).await?;
            if let Some(dir) = output {
                config.output.directory = dir;
            }
            if headful {
                config.browser.headless = false;
            }
            let options = harvest::HarvestOptions {
                resolve: !no_resolve,
                print,
            };
            harvest::cmd_harvest(&config, &url, options).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(cli.config.as_deref()).await,
            ConfigCommands::Init { path, force } => config_cmd::cmd_config_init(path, force),
        },
    }
}
