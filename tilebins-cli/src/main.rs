//! Tilebins CLI - Command-line interface
//!
//! This binary enumerates pyramid tiles for a viewport and fetches their
//! data from a tile server as bin records.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tilebins::config::ClientConfig;
use tilebins::logging::{init_logging, LoggingGuard};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::tiles::TilesArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilebins")]
#[command(version, about = "Enumerate and fetch pyramid tiles as bin records", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tilebins/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the log file, overriding the configuration
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tiles covering a viewport
    Tiles(TilesArgs),

    /// Fetch a viewport's tiles and print their bins as JSON lines
    Fetch(FetchArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config,
        log_dir,
        command,
    } = cli;
    let config_path = config.as_deref();

    match command {
        Commands::Config { command } => commands::config::run(command, config_path),
        Commands::Tiles(args) => {
            let (client, _logging_guard) = setup(config_path, log_dir)?;
            commands::tiles::run(args, client)
        }
        Commands::Fetch(args) => {
            let (client, _logging_guard) = setup(config_path, log_dir)?;
            commands::fetch::run(args, client)
        }
    }
}

/// Loads configuration and starts logging.
fn setup(
    config_path: Option<&Path>,
    log_dir: Option<PathBuf>,
) -> Result<(ClientConfig, LoggingGuard), CliError> {
    let mut config = commands::common::load_config(config_path)?;
    if let Some(dir) = log_dir {
        config.logging.directory = Some(dir);
    }
    let guard = init_logging(&config.logging).map_err(CliError::LoggingInit)?;
    Ok((config.client, guard))
}
