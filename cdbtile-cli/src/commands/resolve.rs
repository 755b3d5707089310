//! Resolve command - print the CDB address of an extent.

use std::path::PathBuf;

use cdbtile::address::{resolve, TileAddress};
use cdbtile::config::ConfigFile;

use super::common::{ContentArg, ExtentArgs};
use crate::error::CliError;

/// Arguments for the resolve command.
pub struct ResolveArgs {
    pub extent: ExtentArgs,
    pub content: ContentArg,
    pub level_hint: Option<u8>,
    pub root: Option<PathBuf>,
    pub json: bool,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let extent = args.extent.to_extent()?;
    let config = ConfigFile::load().unwrap_or_default();

    let root = args
        .root
        .or(config.cdb.root_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let address = resolve(
        &extent,
        args.content.into(),
        args.level_hint,
        &root,
        config.cdb.cache_dir.as_deref(),
    );

    if args.json {
        let text = serde_json::to_string_pretty(&address)
            .map_err(|e| CliError::InvalidArgs(e.to_string()))?;
        println!("{}", text);
    } else {
        print_address(&address);
    }
    Ok(())
}

fn print_address(address: &TileAddress) {
    println!("Tile:       {}", address.file_name(address.content));
    println!("  Content:  {:?}", address.content);
    println!("  LOD:      {} ({})", address.lod, address.lod_label);
    println!("  Geocell:  {}", address.base);
    println!("  Index:    {} {}", address.uref_label(), address.rref_label());
    println!("  Size:     {} px", address.tile_size);
    if address.hinted {
        println!("  Asset:    sub-base level (LC directory)");
    } else if address.is_cache_level() {
        let rows = 1u32 << address.lod.unsigned_abs().min(31);
        println!("  Asset:    composite of {} geocell rows", rows);
    }
    println!();
    println!("Primary:    {}", address.primary_path.display());
    match &address.cache_path {
        Some(path) => println!("Cache:      {}", path.display()),
        None => println!("Cache:      (caching disabled)"),
    }
}
