//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization and dataset opening to reduce
//! duplication across command handlers.

use tracing::info;

use cdbtile::config::ConfigFile;
use cdbtile::logging::{init_logging, LoggingGuard};
use cdbtile::source::{CdbOptions, CdbTileSource};

use crate::commands::common::DatasetArgs;
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Loads the configuration and initializes logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Also print log records to stdout
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(
            &config.logging.directory,
            &config.logging.file,
            verbose,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("cdbtile v{}", cdbtile::VERSION);
        info!("cdbtile CLI: {} command", command);
    }

    /// Dataset options from the configuration with command-line overrides applied.
    pub fn options(&self, args: &DatasetArgs) -> Result<CdbOptions, CliError> {
        let mut config = self.config.clone();
        if let Some(root) = &args.root {
            config.cdb.root_dir = Some(root.clone());
        }
        if let Some(cache_dir) = &args.cache_dir {
            config.cdb.cache_dir = Some(cache_dir.clone());
        }
        if args.no_cache {
            config.cdb.cache_dir = None;
        }
        if let Some(tile_size) = args.tile_size {
            config.cdb.tile_size = tile_size;
        }

        CdbOptions::from_config(&config).map_err(CliError::Open)
    }

    /// Opens the dataset selected by `args`.
    pub fn open_source(&self, args: &DatasetArgs) -> Result<CdbTileSource, CliError> {
        let options = self.options(args)?;
        CdbTileSource::new(options)
            .map_err(CliError::Open)
            .inspect(|_| info!("Dataset opened"))
    }
}
