//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show`, and `config path`.

use std::path::Path;

use clap::Subcommand;
use tilebins::config::{config_file_path, ConfigFile};
use tilebins::pyramid::PyramidConfig;

use super::common::load_config;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file if none exists
    Init,

    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init => run_init(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_init(path: &Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists(path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = load_config(Some(path))?;
    for line in describe(&config) {
        println!("{}", line);
    }
    Ok(())
}

/// Settings as `[section]` headers followed by `key = value` lines.
fn describe(config: &ConfigFile) -> Vec<String> {
    let client = &config.client;
    let mut lines = vec![
        "[server]".to_string(),
        format!("  base_url = {}", client.server.base_url),
        format!("  layer = {}", client.server.layer),
        format!("  timeout = {}", client.server.timeout_secs),
        String::new(),
        "[tiles]".to_string(),
        format!("  x_bin_count = {}", client.bins.x),
        format!("  y_bin_count = {}", client.bins.y),
        String::new(),
        "[pyramid]".to_string(),
        format!("  type = {}", client.pyramid.name()),
    ];
    if let PyramidConfig::Aoi {
        min_x,
        min_y,
        max_x,
        max_y,
    } = &client.pyramid
    {
        lines.push(format!("  bounds = {}, {} .. {}, {}", min_x, min_y, max_x, max_y));
    }

    lines.push(String::new());
    lines.push("[logging]".to_string());
    match &config.logging.directory {
        Some(dir) => lines.push(format!("  directory = {}", dir.display())),
        None => lines.push("  directory = (stderr only)".to_string()),
    }
    lines.push(format!("  file = {}", config.logging.file));
    lines
}
