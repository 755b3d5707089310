//! Init command - initialize the configuration file.

use std::path::PathBuf;

use cdbtile::address::TILES_DIR;
use cdbtile::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Keeps existing settings; `root` and `cache` fill in unset values.
pub fn run(root: Option<PathBuf>, cache: Option<PathBuf>) -> Result<(), CliError> {
    let mut config = ConfigFile::load()?;

    if let Some(root) = root {
        if !root.join(TILES_DIR).is_dir() {
            println!(
                "Warning: {} has no {} directory; is it a CDB dataset?",
                root.display(),
                TILES_DIR
            );
        }
        if config.cdb.root_dir.is_none() {
            config.cdb.root_dir = Some(root);
        }
    }
    if config.cdb.cache_dir.is_none() {
        config.cdb.cache_dir = cache;
    }
    config.save()?;

    println!("Configuration file: {}", config_file_path().display());
    match &config.cdb.root_dir {
        Some(root) => println!("  Dataset: {}", root.display()),
        None => println!("  Dataset: (not set, use 'cdbtile config set cdb.root_dir <dir>')"),
    }
    match &config.cdb.cache_dir {
        Some(cache) => println!("  Cache:   {}", cache.display()),
        None => println!("  Cache:   (disabled)"),
    }
    println!();
    println!("Edit this file to customize cdbtile settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
