//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use cdbtile::cache::CacheError;
use cdbtile::config::ConfigFileError;
use cdbtile::raster::RasterError;
use cdbtile::source::SourceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// Failed to open the dataset
    Open(SourceError),
    /// Failed to serve a request
    Request(SourceError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: String },
    /// Cache housekeeping failed
    Cache(CacheError),
    /// Requested content is absent
    NoContent(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Open(SourceError::MissingRoot) => {
                eprintln!();
                eprintln!("Set the dataset location with:");
                eprintln!("  cdbtile config set cdb.root_dir /path/to/cdb");
            }
            CliError::Open(SourceError::Init(_)) => {
                eprintln!();
                eprintln!("Only the GTiff driver is built in. For datasets stored as GeoTIFF:");
                eprintln!("  cdbtile config set drivers.imagery GTiff");
                eprintln!("  cdbtile config set drivers.elevation_cache GTiff");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }

    /// Exit code: 2 for "nothing there", 1 for failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NoContent(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::Open(e) => write!(f, "Failed to open CDB dataset: {}", e),
            CliError::Request(e) => write!(f, "Request failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Cache(e) => write!(f, "Cache operation failed: {}", e),
            CliError::NoContent(what) => write!(f, "No content for {}", what),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Open(e) | CliError::Request(e) => Some(e),
            CliError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<RasterError> for CliError {
    fn from(e: RasterError) -> Self {
        CliError::Request(SourceError::Tile(e.into()))
    }
}
