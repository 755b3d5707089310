//! Cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use cdbtile::address::parse_tile_filename;
use cdbtile::cache::{cache_stats, clear_cache, list_cache};
use cdbtile::config::ConfigFile;

use super::common::format_size;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Delete every cached composite
    Clear,
    /// Show cache statistics
    Stats,
    /// List cached composites
    List,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let cache_dir = cache_directory(&config)?;

    match action {
        CacheAction::Clear => {
            println!("Clearing cache at: {}", cache_dir.display());
            let removed = clear_cache(&cache_dir)?;
            println!(
                "Deleted {} files, freed {}",
                removed.total_files(),
                format_size(removed.total_bytes)
            );
        }
        CacheAction::Stats => {
            println!("Cache: {}", cache_dir.display());
            let stats = cache_stats(&cache_dir)?;
            println!("  Imagery:   {} files", stats.imagery_files);
            println!("  Elevation: {} files", stats.elevation_files);
            println!("  Size:      {}", format_size(stats.total_bytes));
        }
        CacheAction::List => {
            for path in list_cache(&cache_dir)? {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match parse_tile_filename(&name) {
                    Ok(tile) => println!(
                        "{:<8} {:>5}  {}  {}",
                        tile.lod.to_string(),
                        tile.content()
                            .map(|c| format!("{:?}", c))
                            .unwrap_or_else(|| "?".to_string()),
                        tile.base,
                        path.display()
                    ),
                    Err(_) => println!("{:<8} {:>5}  {}", "-", "?", path.display()),
                }
            }
        }
    }
    Ok(())
}

fn cache_directory(config: &ConfigFile) -> Result<PathBuf, CliError> {
    config.cdb.cache_dir.clone().ok_or_else(|| {
        CliError::Config(
            "No cache directory configured. Set one with 'cdbtile config set cdb.cache_dir <dir>'"
                .to_string(),
        )
    })
}
