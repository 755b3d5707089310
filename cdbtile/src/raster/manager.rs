//! Driver lookup by name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{GeoTiffDriver, RasterDriver};

/// Source of raster drivers, looked up by name.
///
/// Implementations must be safe to share between threads.
pub trait DriverManager: Send + Sync {
    /// Returns the driver registered as `name`, if any.
    fn driver_by_name(&self, name: &str) -> Option<Arc<dyn RasterDriver>>;

    /// Names of all registered drivers, sorted.
    fn driver_names(&self) -> Vec<String>;
}

/// In-process driver manager.
///
/// Starts with the built-in GeoTIFF driver; further codecs are added with
/// [`BuiltinDriverManager::register`].
pub struct BuiltinDriverManager {
    drivers: RwLock<HashMap<String, Arc<dyn RasterDriver>>>,
}

impl BuiltinDriverManager {
    /// Creates a manager with no drivers.
    pub fn empty() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a manager holding the built-in drivers.
    pub fn new() -> Self {
        let manager = Self::empty();
        manager.register(Arc::new(GeoTiffDriver));
        manager
    }

    /// Registers a driver under its own name, returning any driver it replaced.
    pub fn register(&self, driver: Arc<dyn RasterDriver>) -> Option<Arc<dyn RasterDriver>> {
        let name = driver.name().to_string();
        tracing::debug!(driver = %name, "Registering raster driver");
        self.drivers.write().insert(name, driver)
    }

    /// Removes a driver by name.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn RasterDriver>> {
        self.drivers.write().remove(name)
    }
}

impl Default for BuiltinDriverManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverManager for BuiltinDriverManager {
    fn driver_by_name(&self, name: &str) -> Option<Arc<dyn RasterDriver>> {
        self.drivers.read().get(name).cloned()
    }

    fn driver_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for BuiltinDriverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinDriverManager")
            .field("drivers", &self.driver_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GEOTIFF_DRIVER_NAME;

    #[test]
    fn test_new_has_geotiff() {
        let manager = BuiltinDriverManager::new();
        let driver = manager.driver_by_name(GEOTIFF_DRIVER_NAME).unwrap();
        assert_eq!(driver.name(), "GTiff");
        assert!(driver.can_create());
        assert_eq!(manager.driver_names(), vec!["GTiff".to_string()]);
    }

    #[test]
    fn test_empty_has_nothing() {
        let manager = BuiltinDriverManager::empty();
        assert!(manager.driver_by_name("GTiff").is_none());
        assert!(manager.driver_names().is_empty());
    }

    #[test]
    fn test_register_replaces_and_unregister_removes() {
        let manager = BuiltinDriverManager::new();
        let replaced = manager.register(Arc::new(GeoTiffDriver));
        assert!(replaced.is_some());

        assert!(manager.unregister("GTiff").is_some());
        assert!(manager.driver_by_name("GTiff").is_none());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let manager = BuiltinDriverManager::new();
        assert!(manager.driver_by_name("gtiff").is_none());
    }
}
