//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Converts a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let root_dir = optional_path_to_string(config.cdb.root_dir.as_deref());
    let cache_dir = optional_path_to_string(config.cdb.cache_dir.as_deref());
    let limits = config
        .cdb
        .limits
        .map(|l| l.to_string())
        .unwrap_or_default();

    format!(
        r#"[cdb]
; Dataset root: the directory that contains Tiles/
root_dir = {}
; Cache directory for composited tiles. Leave empty to disable caching.
cache_dir = {}
; Pixel size of square tiles (default: 1024)
tile_size = {}
; Finest CDB level served; finer requests return no data (default: 14)
max_lod = {}
; Number of cache levels above LOD 0 used for the top of a limited profile
negative_lods = {}
; Served area as min_lon,min_lat,max_lon,max_lat. Leave empty for the whole earth.
limits = {}

[drivers]
; Raster drivers to try for each codec family, first available wins
imagery = {}
geotiff = {}
elevation_cache = {}

[logging]
; Directory and file name of the log
directory = {}
file = {}
"#,
        root_dir,
        cache_dir,
        config.cdb.tile_size,
        config.cdb.max_lod,
        config.cdb.negative_lods,
        limits,
        config.drivers.imagery.join(", "),
        config.drivers.geotiff.join(", "),
        config.drivers.elevation_cache.join(", "),
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn optional_path_to_string(path: Option<&Path>) -> String {
    path.map(path_to_string).unwrap_or_default()
}

/// Writes paths under the home directory as `~/...`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_string() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("[cdb]"));
        assert!(text.contains("tile_size = 1024"));
        assert!(text.contains("max_lod = 14"));
        assert!(text.contains("imagery = JP2ECW, JP2OpenJPEG, JPEG2000, JP2KAK, JP2MrSID"));
        assert!(text.contains("elevation_cache = HFA"));
        assert!(text.contains("root_dir = \n"));
    }

    #[test]
    fn test_limits_written() {
        let mut config = ConfigFile::default();
        config.cdb.limits = Some("-120.5,30,-110,40".parse().unwrap());
        config.cdb.root_dir = Some(PathBuf::from("/data/cdb"));

        let text = to_config_string(&config);
        assert!(text.contains("limits = -120.5,30,-110,40"));
        assert!(text.contains("root_dir = /data/cdb"));
    }
}
