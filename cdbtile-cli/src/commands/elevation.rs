//! Elevation command - build a height field and report statistics.
//!
//! With `--output` the heights are also written as a single-band GeoTIFF.

use std::path::{Path, PathBuf};

use cdbtile::address::ContentType;
use cdbtile::coord::GeoExtent;
use cdbtile::raster::{BandType, CreateSpec, GeoTiffDriver, GeoTransform, RasterDriver, SpatialRef};

use super::common::{DatasetArgs, ExtentArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the elevation command.
pub struct ElevationArgs {
    pub extent: ExtentArgs,
    pub output: Option<PathBuf>,
    pub dataset: DatasetArgs,
    pub verbose: bool,
}

/// Run the elevation command.
pub fn run(args: ElevationArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("elevation");

    let extent = args.extent.to_extent()?;
    let source = runner.open_source(&args.dataset)?;

    let tile = source
        .fetch_tile(&extent, ContentType::Elevation, None)
        .map_err(CliError::Request)?
        .ok_or_else(|| CliError::NoContent(extent.to_string()))?;
    let field = tile
        .to_height_field()
        .ok_or_else(|| CliError::NoContent(extent.to_string()))?;

    println!("Elevation for {}", extent);
    println!("  Tile:   {}", tile.name());
    println!("  Posts:  {}x{}", field.width, field.height);
    match (field.min_max(), field.mean()) {
        (Some((min, max)), Some(mean)) => {
            println!("  Min:    {:.2} m", min);
            println!("  Max:    {:.2} m", max);
            println!("  Mean:   {:.2} m", mean);
        }
        _ => println!("  No valid posts"),
    }

    if let Some(output) = &args.output {
        let heights = tile
            .buffer()
            .and_then(|b| b.heights())
            .ok_or_else(|| CliError::NoContent(extent.to_string()))?;
        write_geotiff(output, &extent, field.width, field.height, heights)?;
        println!("Saved GeoTIFF to {}", output.display());
    }
    Ok(())
}

/// Writes north-up heights as a georeferenced single-band GeoTIFF.
fn write_geotiff(
    path: &Path,
    extent: &GeoExtent,
    width: usize,
    height: usize,
    heights: &[f32],
) -> Result<(), CliError> {
    let spec = CreateSpec {
        width,
        height,
        bands: 1,
        band_type: BandType::Float32,
    };
    let mut dataset = GeoTiffDriver.create(path, &spec)?;
    dataset.set_geo_transform(GeoTransform::from_extent(extent, width, height))?;
    dataset.set_spatial_ref(SpatialRef::WGS84)?;
    dataset.write_band_f32(0, heights)?;
    dataset.flush()?;
    Ok(())
}
