//! Configuration
//!
//! [`ClientConfig`] holds what a client needs to enumerate and fetch tiles.
//! [`ConfigFile`] persists it, together with logging settings, as INI at
//! `~/.tilebins/config.ini`.

mod client;
mod file;

pub use client::{
    ClientConfig, ServerConfig, DEFAULT_BASE_URL, DEFAULT_LAYER, DEFAULT_TIMEOUT_SECS,
};
pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, LoggingSettings,
};
