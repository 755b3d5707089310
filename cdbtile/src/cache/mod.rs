//! Cache store for composited tiles
//!
//! Composites of several geocells are expensive to build, so they can be
//! written back as cache files named by the same CDB convention (`.tif` for
//! imagery, `.img` for elevation). This module persists tiles and provides
//! housekeeping over a cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::address::ContentType;
use crate::tile::{Tile, TileError};

/// Errors from cache housekeeping.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes composited tiles to the cache store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheWriter;

impl CacheWriter {
    /// Saves a tile and marks it as present on success.
    ///
    /// The tile must hold cache content and decoded pixels.
    pub fn persist(tile: &mut Tile) -> Result<(), TileError> {
        tile.save()?;
        tile.mark_exists();
        Ok(())
    }
}

/// File counts and sizes of a cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub imagery_files: usize,
    pub elevation_files: usize,
    pub total_bytes: u64,
}

impl CacheStats {
    pub fn total_files(&self) -> usize {
        self.imagery_files + self.elevation_files
    }
}

/// Cache files below `dir`, imagery first.
fn cache_files(dir: &Path) -> Result<Vec<(ContentType, PathBuf)>, CacheError> {
    let mut files = Vec::new();
    for content in [ContentType::ImageryCache, ContentType::ElevationCache] {
        let pattern = dir
            .join("**")
            .join(format!("*{}", content.extension()))
            .to_string_lossy()
            .into_owned();

        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => files.push((content, path)),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable cache entry"),
            }
        }
    }
    Ok(files)
}

/// Counts cache files and their total size.
///
/// A missing directory is an empty cache.
pub fn cache_stats(dir: &Path) -> Result<CacheStats, CacheError> {
    let mut stats = CacheStats::default();
    if !dir.exists() {
        return Ok(stats);
    }

    for (content, path) in cache_files(dir)? {
        let meta = fs::metadata(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        stats.total_bytes += meta.len();
        match content {
            ContentType::ImageryCache => stats.imagery_files += 1,
            _ => stats.elevation_files += 1,
        }
    }
    Ok(stats)
}

/// Cache files below `dir`, sorted by path.
pub fn list_cache(dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = cache_files(dir)?.into_iter().map(|(_, p)| p).collect();
    paths.sort();
    Ok(paths)
}

/// Deletes every cache file below `dir`, returning what was removed.
///
/// Directories are left in place.
pub fn clear_cache(dir: &Path) -> Result<CacheStats, CacheError> {
    let mut removed = CacheStats::default();
    if !dir.exists() {
        return Ok(removed);
    }

    for (content, path) in cache_files(dir)? {
        let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        fs::remove_file(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        removed.total_bytes += len;
        match content {
            ContentType::ImageryCache => removed.imagery_files += 1,
            _ => removed.elevation_files += 1,
        }
    }

    tracing::info!(
        dir = %dir.display(),
        files = removed.total_files(),
        bytes = removed.total_bytes,
        "Cleared cache"
    );
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_stats_missing_dir() {
        let temp = TempDir::new().unwrap();
        let stats = cache_stats(&temp.path().join("nope")).unwrap();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_stats_counts_by_extension() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("004_Imagery/a.tif"), 10);
        write(&temp.path().join("Tiles/N60/E000/004_Imagery/L00/U0/b.tif"), 5);
        write(&temp.path().join("001_Elevation/c.img"), 7);
        write(&temp.path().join("notes.txt"), 100);

        let stats = cache_stats(temp.path()).unwrap();
        assert_eq!(stats.imagery_files, 2);
        assert_eq!(stats.elevation_files, 1);
        assert_eq!(stats.total_files(), 3);
        assert_eq!(stats.total_bytes, 22);
    }

    #[test]
    fn test_list_is_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("001_Elevation/b.img"), 1);
        write(&temp.path().join("004_Imagery/a.tif"), 1);
        write(&temp.path().join("004_Imagery/z.txt"), 1);

        let paths = list_cache(temp.path()).unwrap();
        assert_eq!(
            paths,
            vec![
                temp.path().join("001_Elevation/b.img"),
                temp.path().join("004_Imagery/a.tif"),
            ]
        );
        assert!(list_cache(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_only_cache_files() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("004_Imagery/a.tif"), 10);
        write(&temp.path().join("001_Elevation/c.img"), 7);
        write(&temp.path().join("keep.txt"), 1);

        let removed = clear_cache(temp.path()).unwrap();
        assert_eq!(removed.total_files(), 2);
        assert_eq!(removed.total_bytes, 17);

        assert!(temp.path().join("keep.txt").exists());
        assert!(temp.path().join("004_Imagery").is_dir());
        assert_eq!(cache_stats(temp.path()).unwrap().total_files(), 0);
    }
}
