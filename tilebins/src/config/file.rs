//! Configuration file handling for ~/.tilebins/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Missing keys
//! keep their default; present keys must parse or loading fails with
//! [`ConfigFileError::InvalidValue`].

use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use thiserror::Error;

use super::client::ClientConfig;
use crate::coord::BinCounts;
use crate::pyramid::PyramidConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Log file settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for the log file; `None` logs to stderr only
    pub directory: Option<PathBuf>,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            file: "tilebins.log".to_string(),
        }
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub client: ClientConfig,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilebins/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.tilebins/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, to_config_string(self))
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file at `path` if it doesn't exist.
    ///
    /// Returns true if a file was written.
    pub fn ensure_exists(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }
}

/// Get the path to the config directory (~/.tilebins).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilebins")
}

/// Get the path to the config file (~/.tilebins/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_num<N: std::str::FromStr>(
    props: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<N>, ConfigFileError> {
    match props.get(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, v, reason)),
    }
}

fn non_empty(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Starts from defaults and overlays every value found in the INI.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server]
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = non_empty(section, "base_url") {
            config.client.server.base_url = v;
        }
        if let Some(v) = non_empty(section, "layer") {
            config.client.server.layer = v;
        }
        if let Some(v) = parse_num::<u64>(section, "server", "timeout", "expected seconds")? {
            if v == 0 {
                return Err(invalid("server", "timeout", "0", "must be positive"));
            }
            config.client.server.timeout_secs = v;
        }
    }

    // [tiles]
    if let Some(section) = ini.section(Some("tiles")) {
        let reason = "expected a positive integer";
        let x = parse_num::<u32>(section, "tiles", "x_bin_count", reason)?
            .unwrap_or(config.client.bins.x);
        let y = parse_num::<u32>(section, "tiles", "y_bin_count", reason)?
            .unwrap_or(config.client.bins.y);
        config.client.bins = BinCounts::new(x, y).map_err(|e| {
            let value = format!("{}x{}", x, y);
            invalid("tiles", "x_bin_count/y_bin_count", &value, &e.to_string())
        })?;
    }

    // [pyramid]
    if let Some(section) = ini.section(Some("pyramid")) {
        let kind = section.get("type").map(|v| v.trim().to_lowercase());
        match kind.as_deref() {
            None | Some("") | Some("web-mercator") => {}
            Some("aoi") => {
                let reason = "expected a number";
                let edge = |key: &str| -> Result<f64, ConfigFileError> {
                    parse_num::<f64>(section, "pyramid", key, reason)?
                        .ok_or_else(|| invalid("pyramid", key, "", "required for type = aoi"))
                };
                let aoi = PyramidConfig::Aoi {
                    min_x: edge("min_x")?,
                    min_y: edge("min_y")?,
                    max_x: edge("max_x")?,
                    max_y: edge("max_y")?,
                };
                aoi.create()
                    .map_err(|e| invalid("pyramid", "type", "aoi", &e.to_string()))?;
                config.client.pyramid = aoi;
            }
            Some(other) => {
                return Err(invalid(
                    "pyramid",
                    "type",
                    other,
                    "must be one of: web-mercator, aoi",
                ))
            }
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = Some(expand_tilde(&v));
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v;
        }
    }

    Ok(config)
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Commented INI text for a configuration.
fn to_config_string(config: &ConfigFile) -> String {
    let client = &config.client;
    let pyramid = match &client.pyramid {
        PyramidConfig::WebMercator => "type = web-mercator\n".to_string(),
        PyramidConfig::Aoi {
            min_x,
            min_y,
            max_x,
            max_y,
        } => format!(
            "type = aoi\nmin_x = {}\nmin_y = {}\nmax_x = {}\nmax_y = {}\n",
            min_x, min_y, max_x, max_y
        ),
    };
    let log_dir = config
        .logging
        .directory
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[server]
; Tile service root; tiles are fetched from {{base_url}}/1.0.0/{{layer}}/{{level}}/{{x}}/{{y}}.json
base_url = {}
layer = {}
; Per-request timeout in seconds
timeout = {}

[tiles]
; Bins per tile along each axis
x_bin_count = {}
y_bin_count = {}

[pyramid]
; web-mercator, or aoi with min_x/min_y/max_x/max_y root bounds
{}
[logging]
; Leave directory empty to log to stderr only
directory = {}
file = {}
"#,
        client.server.base_url,
        client.server.layer,
        client.server.timeout_secs,
        client.bins.x,
        client.bins.y,
        pyramid,
        log_dir,
        config.logging.file,
    )
}
