//! Probe command - check for content without decoding any tile.

use cdbtile::address::{resolve, ContentType};
use cdbtile::probe::find_in_region;

use super::common::{ContentArg, DatasetArgs, ExtentArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the probe command.
pub struct ProbeArgs {
    pub extent: ExtentArgs,
    pub content: ContentArg,
    pub dataset: DatasetArgs,
    pub verbose: bool,
}

/// Run the probe command.
///
/// Exits with code 2 when no content is found.
pub fn run(args: ProbeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("probe");

    let extent = args.extent.to_extent()?;
    let content: ContentType = args.content.into();
    let source = runner.open_source(&args.dataset)?;

    let found = source
        .has_content(&extent, content)
        .map_err(CliError::Request)?;

    let ctx = source.context();
    let address = resolve(&extent, content, None, ctx.root(), ctx.cache_root());
    println!("Request:  {}", extent);
    println!("Tile:     {}", address.file_name(address.content));

    if address.is_cache_level() {
        let hit = find_in_region(
            address.lod,
            address.base,
            content.source_variant(),
            ctx.root(),
        )
        .map_err(|e| CliError::Request(e.into()))?;
        if let Some(cell) = hit {
            println!("First geocell with content: {}", cell.cell);
        }
    }

    if found {
        println!("Content:  present");
        Ok(())
    } else {
        println!("Content:  none");
        Err(CliError::NoContent(extent.to_string()))
    }
}
