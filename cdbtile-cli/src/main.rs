//! cdbtile CLI - Command-line interface
//!
//! Resolves CDB tile addresses, probes datasets for content, and exports
//! composited imagery and elevation.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::common::{ContentArg, DatasetArgs, ExtentArgs};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "cdbtile")]
#[command(version = cdbtile::VERSION)]
#[command(about = "Tile addressing and raster composition for CDB datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CDB address of an extent
    Resolve {
        #[command(flatten)]
        extent: ExtentArgs,

        /// Content to address
        #[arg(long, value_enum, default_value = "imagery")]
        content: ContentArg,

        /// Sub-base level for one-degree requests (selects an LC asset)
        #[arg(long)]
        level_hint: Option<u8>,

        /// CDB root directory (overrides cdb.root_dir)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a dataset has content for an extent
    Probe {
        #[command(flatten)]
        extent: ExtentArgs,

        /// Content to look for
        #[arg(long, value_enum, default_value = "imagery")]
        content: ContentArg,

        #[command(flatten)]
        dataset: DatasetArgs,

        /// Print log output to stdout
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build imagery for an extent and save it as PNG
    Image {
        #[command(flatten)]
        extent: ExtentArgs,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        dataset: DatasetArgs,

        /// Print log output to stdout
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build elevation for an extent and print statistics
    Elevation {
        #[command(flatten)]
        extent: ExtentArgs,

        /// Also write the heights as a GeoTIFF
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        dataset: DatasetArgs,

        /// Print log output to stdout
        #[arg(short, long)]
        verbose: bool,
    },

    /// Manage the composite cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Create the configuration file
    Init {
        /// CDB root directory
        #[arg(long)]
        root: Option<PathBuf>,

        /// Cache directory for composites
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            extent,
            content,
            level_hint,
            root,
            json,
        } => commands::resolve::run(commands::resolve::ResolveArgs {
            extent,
            content,
            level_hint,
            root,
            json,
        }),
        Commands::Probe {
            extent,
            content,
            dataset,
            verbose,
        } => commands::probe::run(commands::probe::ProbeArgs {
            extent,
            content,
            dataset,
            verbose,
        }),
        Commands::Image {
            extent,
            output,
            dataset,
            verbose,
        } => commands::image::run(commands::image::ImageArgs {
            extent,
            output,
            dataset,
            verbose,
        }),
        Commands::Elevation {
            extent,
            output,
            dataset,
            verbose,
        } => commands::elevation::run(commands::elevation::ElevationArgs {
            extent,
            output,
            dataset,
            verbose,
        }),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
        Commands::Init { root, cache_dir } => commands::init::run(root, cache_dir),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "cdbtile", "resolve", "--north", "-33", "--south", "-34", "--east", "152", "--west",
            "151", "--content", "elevation",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                extent, content, ..
            } => {
                assert_eq!(extent.south, -34.0);
                assert_eq!(content, ContentArg::Elevation);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_no_cache_conflicts_with_cache_dir() {
        let result = Cli::try_parse_from([
            "cdbtile", "probe", "--north", "1", "--south", "0", "--east", "1", "--west", "0",
            "--no-cache", "--cache-dir", "/tmp/c",
        ]);
        assert!(result.is_err());
    }
}
