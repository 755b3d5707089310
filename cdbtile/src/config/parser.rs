//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::profile::DataLimits;
use crate::raster::DriverPreferences;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cdb] section
    if let Some(section) = ini.section(Some("cdb")) {
        if let Some(v) = section.get("root_dir") {
            config.cdb.root_dir = optional_path(v);
        }
        if let Some(v) = section.get("cache_dir") {
            config.cdb.cache_dir = optional_path(v);
        }
        if let Some(v) = section.get("tile_size") {
            config.cdb.tile_size = parse_tile_size(v)
                .ok_or_else(|| invalid("cdb", "tile_size", v, "must be a positive integer"))?;
        }
        if let Some(v) = section.get("max_lod") {
            config.cdb.max_lod = parse_max_lod(v)
                .ok_or_else(|| invalid("cdb", "max_lod", v, "must be an integer from 0 to 23"))?;
        }
        if let Some(v) = section.get("negative_lods") {
            config.cdb.negative_lods = parse_negative_lods(v).ok_or_else(|| {
                invalid("cdb", "negative_lods", v, "must be an integer from 0 to 10")
            })?;
        }
        if let Some(v) = section.get("limits") {
            let v = v.trim();
            if !v.is_empty() {
                config.cdb.limits = Some(DataLimits::parse(v).map_err(|_| {
                    invalid(
                        "cdb",
                        "limits",
                        v,
                        "expected min_lon,min_lat,max_lon,max_lat",
                    )
                })?);
            }
        }
    }

    // [drivers] section
    if let Some(section) = ini.section(Some("drivers")) {
        for (key, target) in [
            ("imagery", &mut config.drivers.imagery),
            ("geotiff", &mut config.drivers.geotiff),
            ("elevation_cache", &mut config.drivers.elevation_cache),
        ] {
            if let Some(v) = section.get(key) {
                let names = DriverPreferences::parse_list(v);
                if names.is_empty() {
                    return Err(invalid(
                        "drivers",
                        key,
                        v,
                        "must list at least one driver name",
                    ));
                }
                *target = names;
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

pub(super) fn parse_tile_size(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

pub(super) fn parse_max_lod(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|n| (0..=23).contains(n))
}

pub(super) fn parse_negative_lods(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n <= 10)
}

/// Empty values mean "unset".
pub(super) fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| expand_tilde(value))
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
