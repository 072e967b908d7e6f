//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilebins::config::ConfigFileError;
use tilebins::pyramid::PyramidError;
use tilebins::transport::TransportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(ConfigFileError),
    /// Invalid argument combination
    Usage(String),
    /// Pyramid rejected the viewport
    Pyramid(PyramidError),
    /// Failed to set up the tile transport
    Transport(TransportError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Fetches still outstanding when the wait expired
    Timeout { pending: usize },
    /// Failed to write command output
    Output(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Timeout { .. } => {
                eprintln!();
                eprintln!("Check that the tile server is reachable, or raise [server] timeout");
                eprintln!("in the configuration file (tilebins config path).");
            }
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'tilebins config show' to inspect the loaded values.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Pyramid(e) => write!(f, "Invalid viewport: {}", e),
            CliError::Transport(e) => write!(f, "Failed to create transport: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Timeout { pending } => {
                write!(f, "Timed out with {} tile fetch(es) outstanding", pending)
            }
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Pyramid(e) => Some(e),
            CliError::Transport(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<PyramidError> for CliError {
    fn from(e: PyramidError) -> Self {
        CliError::Pyramid(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}
