//! CDB tile addressing
//!
//! Converts a geographic request into the dataset's canonical path
//! components: geocell, level-of-detail label, sub-tile indices and the
//! primary and cache file paths. Everything here is pure; existence checks
//! live in [`crate::probe`].
//!
//! # Layout
//!
//! ```text
//! <root>/Tiles/<LAT>/<LON>/<Layer>/<LodLabel|LC>/U<row>/<LAT><LON><Tag><LodLabel>_U<row>_R<col><ext>
//! <cache>/<Layer>/<filename>                       (multi-geocell composites)
//! <cache>/Tiles/...                                (per-tile cache, nested as above)
//! ```

mod content;
mod filename;
mod layout;

pub use content::ContentType;
pub use filename::{parse_tile_filename, ParseError, TileFilename};
pub use layout::{geocell_path, resolve, TileAddress, LC_DIR, TILES_DIR};
