//! Image command - build imagery for an extent and save it as PNG.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use super::common::{DatasetArgs, ExtentArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the image command.
pub struct ImageArgs {
    pub extent: ExtentArgs,
    pub output: PathBuf,
    pub dataset: DatasetArgs,
    pub verbose: bool,
}

/// Run the image command.
pub fn run(args: ImageArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("image");

    let extent = args.extent.to_extent()?;
    let source = runner.open_source(&args.dataset)?;

    println!("Building imagery for {}", extent);
    let start = Instant::now();

    let image = source
        .create_image(&extent)
        .map_err(CliError::Request)?
        .ok_or_else(|| CliError::NoContent(extent.to_string()))?;

    let elapsed = start.elapsed();
    info!(
        width = image.width,
        height = image.height,
        elapsed_ms = elapsed.as_millis() as u64,
        "Imagery built"
    );

    image
        .to_rgba_image()
        .save(&args.output)
        .map_err(|e| CliError::FileWrite {
            path: args.output.clone(),
            error: e.to_string(),
        })?;

    println!(
        "Saved {}x{} image to {} ({:.2}s)",
        image.width,
        image.height,
        args.output.display(),
        elapsed.as_secs_f64()
    );
    Ok(())
}
