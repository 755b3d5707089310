//! Resolution of the three codec families a CDB dataset needs.
//!
//! Each family is described by an ordered list of driver names. The first
//! name the [`DriverManager`] knows and can open with wins. A family with no
//! usable driver is a fatal initialization error.

use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::{DriverManager, RasterDriver};
use crate::address::ContentType;

/// JPEG 2000 backends in preference order.
pub const DEFAULT_IMAGERY_DRIVERS: &[&str] =
    &["JP2ECW", "JP2OpenJPEG", "JPEG2000", "JP2KAK", "JP2MrSID"];

/// GeoTIFF backends in preference order.
pub const DEFAULT_GEOTIFF_DRIVERS: &[&str] = &["GTiff"];

/// ERDAS Imagine backends in preference order.
pub const DEFAULT_ELEVATION_CACHE_DRIVERS: &[&str] = &["HFA"];

/// Codec family bound to a group of content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverFamily {
    /// Compressed source imagery (JPEG 2000)
    Imagery,
    /// Source elevation and imagery cache (GeoTIFF)
    GeoTiff,
    /// Elevation cache (ERDAS Imagine)
    ElevationCache,
}

impl DriverFamily {
    pub fn all() -> [DriverFamily; 3] {
        [
            DriverFamily::Imagery,
            DriverFamily::GeoTiff,
            DriverFamily::ElevationCache,
        ]
    }
}

impl fmt::Display for DriverFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFamily::Imagery => write!(f, "imagery"),
            DriverFamily::GeoTiff => write!(f, "GeoTIFF"),
            DriverFamily::ElevationCache => write!(f, "elevation cache"),
        }
    }
}

/// Ordered driver names per family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverPreferences {
    pub imagery: Vec<String>,
    pub geotiff: Vec<String>,
    pub elevation_cache: Vec<String>,
}

impl Default for DriverPreferences {
    fn default() -> Self {
        Self {
            imagery: to_strings(DEFAULT_IMAGERY_DRIVERS),
            geotiff: to_strings(DEFAULT_GEOTIFF_DRIVERS),
            elevation_cache: to_strings(DEFAULT_ELEVATION_CACHE_DRIVERS),
        }
    }
}

impl DriverPreferences {
    /// Preferences serving every family from the GeoTIFF driver.
    ///
    /// Suits datasets whose imagery and caches are stored as GeoTIFF.
    pub fn geotiff_only() -> Self {
        Self {
            imagery: to_strings(DEFAULT_GEOTIFF_DRIVERS),
            geotiff: to_strings(DEFAULT_GEOTIFF_DRIVERS),
            elevation_cache: to_strings(DEFAULT_GEOTIFF_DRIVERS),
        }
    }

    /// Names to try for `family`, best first.
    pub fn for_family(&self, family: DriverFamily) -> &[String] {
        match family {
            DriverFamily::Imagery => &self.imagery,
            DriverFamily::GeoTiff => &self.geotiff,
            DriverFamily::ElevationCache => &self.elevation_cache,
        }
    }

    /// Parses a comma-separated preference list, dropping empty entries.
    pub fn parse_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Errors resolving codec families.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverInitError {
    #[error("No {family} driver found (tried: {tried})")]
    NotFound { family: DriverFamily, tried: String },

    #[error("No {family} drivers configured")]
    EmptyPreferences { family: DriverFamily },
}

/// The resolved codec for each family.
#[derive(Clone)]
pub struct DriverRegistry {
    imagery: Arc<dyn RasterDriver>,
    geotiff: Arc<dyn RasterDriver>,
    elevation_cache: Arc<dyn RasterDriver>,
}

impl DriverRegistry {
    /// Resolves every family against `manager`.
    ///
    /// # Returns
    ///
    /// The registry, or the first family that could not be resolved.
    pub fn initialize(
        manager: &dyn DriverManager,
        preferences: &DriverPreferences,
    ) -> Result<Self, DriverInitError> {
        let registry = Self {
            imagery: resolve_family(manager, preferences, DriverFamily::Imagery)?,
            geotiff: resolve_family(manager, preferences, DriverFamily::GeoTiff)?,
            elevation_cache: resolve_family(manager, preferences, DriverFamily::ElevationCache)?,
        };

        tracing::info!(
            imagery = registry.imagery.name(),
            geotiff = registry.geotiff.name(),
            elevation_cache = registry.elevation_cache.name(),
            "Raster drivers initialized"
        );

        Ok(registry)
    }

    /// The driver bound to `family`.
    pub fn driver(&self, family: DriverFamily) -> &Arc<dyn RasterDriver> {
        match family {
            DriverFamily::Imagery => &self.imagery,
            DriverFamily::GeoTiff => &self.geotiff,
            DriverFamily::ElevationCache => &self.elevation_cache,
        }
    }

    /// The driver that reads and writes `content`.
    pub fn for_content(&self, content: ContentType) -> &Arc<dyn RasterDriver> {
        self.driver(content.driver_family())
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("imagery", &self.imagery.name())
            .field("geotiff", &self.geotiff.name())
            .field("elevation_cache", &self.elevation_cache.name())
            .finish()
    }
}

fn resolve_family(
    manager: &dyn DriverManager,
    preferences: &DriverPreferences,
    family: DriverFamily,
) -> Result<Arc<dyn RasterDriver>, DriverInitError> {
    let names = preferences.for_family(family);
    if names.is_empty() {
        return Err(DriverInitError::EmptyPreferences { family });
    }

    for name in names {
        match manager.driver_by_name(name) {
            Some(driver) if driver.can_open() => return Ok(driver),
            Some(_) => {
                tracing::debug!(driver = %name, %family, "Driver cannot open files, skipping")
            }
            None => tracing::trace!(driver = %name, %family, "Driver not registered"),
        }
    }

    Err(DriverInitError::NotFound {
        family,
        tried: names.join(", "),
    })
}

static GLOBAL_REGISTRY: OnceLock<Arc<DriverRegistry>> = OnceLock::new();

/// Initializes the process-wide registry once.
///
/// Later calls return the registry from the first successful call and ignore
/// their arguments. A failed call leaves the registry uninitialized.
pub fn init_global_registry(
    manager: &dyn DriverManager,
    preferences: &DriverPreferences,
) -> Result<Arc<DriverRegistry>, DriverInitError> {
    if let Some(registry) = GLOBAL_REGISTRY.get() {
        return Ok(Arc::clone(registry));
    }
    let registry = Arc::new(DriverRegistry::initialize(manager, preferences)?);
    Ok(Arc::clone(GLOBAL_REGISTRY.get_or_init(|| registry)))
}

/// The process-wide registry, if it has been initialized.
pub fn global_registry() -> Option<Arc<DriverRegistry>> {
    GLOBAL_REGISTRY.get().cloned()
}
