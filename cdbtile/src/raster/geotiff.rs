//! Built-in GeoTIFF codec
//!
//! Reads and writes uncompressed GeoTIFF with pure Rust (the `tiff` crate).
//! Supports 8-bit RGB and grey imagery and single-band floating point
//! elevation. Integer elevation samples are widened to `f32` on read.
//!
//! Georeferencing is stored in the standard GeoTIFF tags: ModelPixelScale,
//! ModelTiepoint and a GeoKeyDirectory naming a geographic EPSG code.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8, RGB8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::{ColorType, TiffError};

use super::{BandType, CreateSpec, GeoTransform, RasterDataset, RasterDriver, RasterError, SpatialRef};

/// Name under which the GeoTIFF driver is registered.
pub const GEOTIFF_DRIVER_NAME: &str = "GTiff";

// GeoTIFF tag IDs
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey IDs and values
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// GeoTIFF driver backed by the `tiff` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoTiffDriver;

impl RasterDriver for GeoTiffDriver {
    fn name(&self) -> &str {
        GEOTIFF_DRIVER_NAME
    }

    fn can_create(&self) -> bool {
        true
    }

    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>, RasterError> {
        Ok(Box::new(GeoTiffDataset::open(path)?))
    }

    fn create(&self, path: &Path, spec: &CreateSpec) -> Result<Box<dyn RasterDataset>, RasterError> {
        Ok(Box::new(GeoTiffDataset::create(path, spec)?))
    }
}

/// Pixel-interleaved samples of every band.
#[derive(Debug, Clone)]
enum Samples {
    Byte(Vec<u8>),
    Float(Vec<f32>),
}

/// A GeoTIFF file held in memory.
///
/// Opened datasets decode the whole image up front; created datasets are
/// encoded on [`RasterDataset::flush`].
#[derive(Debug)]
pub struct GeoTiffDataset {
    path: PathBuf,
    width: usize,
    height: usize,
    bands: usize,
    samples: Samples,
    geo_transform: Option<GeoTransform>,
    spatial_ref: Option<SpatialRef>,
    writable: bool,
    dirty: bool,
}

impl GeoTiffDataset {
    /// Opens and decodes an existing GeoTIFF.
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let file = File::open(path).map_err(|e| RasterError::io(path, e))?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(codec_error(path))?;

        let (width, height) = decoder.dimensions().map_err(codec_error(path))?;
        let color = decoder.colortype().map_err(codec_error(path))?;
        let bands = match color {
            ColorType::Gray(_) => 1,
            ColorType::RGB(8) => 3,
            ColorType::RGBA(8) => 4,
            other => {
                return Err(RasterError::Unsupported {
                    path: path.to_path_buf(),
                    detail: format!("color type {:?}", other),
                })
            }
        };

        let geo_transform = read_geo_transform(&mut decoder);
        let spatial_ref = read_spatial_ref(&mut decoder);

        let samples = match decoder.read_image().map_err(codec_error(path))? {
            DecodingResult::U8(data) => Samples::Byte(data),
            DecodingResult::F32(data) => Samples::Float(data),
            DecodingResult::F64(data) => Samples::Float(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Samples::Float(data.into_iter().map(f32::from).collect()),
            DecodingResult::U16(data) => Samples::Float(data.into_iter().map(f32::from).collect()),
            DecodingResult::I32(data) => Samples::Float(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Samples::Float(data.into_iter().map(|v| v as f32).collect()),
            _ => {
                return Err(RasterError::Unsupported {
                    path: path.to_path_buf(),
                    detail: "sample format".to_string(),
                })
            }
        };

        tracing::trace!(
            path = %path.display(),
            width,
            height,
            bands,
            "Decoded GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: width as usize,
            height: height as usize,
            bands,
            samples,
            geo_transform,
            spatial_ref,
            writable: false,
            dirty: false,
        })
    }

    /// Creates an empty dataset to be written at `path`.
    ///
    /// The parent directory must exist; nothing is written until flush.
    pub fn create(path: &Path, spec: &CreateSpec) -> Result<Self, RasterError> {
        let supported = matches!(
            (spec.band_type, spec.bands),
            (BandType::Byte, 1) | (BandType::Byte, 3) | (BandType::Float32, 1)
        );
        if !supported || spec.width == 0 || spec.height == 0 {
            return Err(RasterError::Unsupported {
                path: path.to_path_buf(),
                detail: format!(
                    "{} band(s) of {} at {}x{}",
                    spec.bands, spec.band_type, spec.width, spec.height
                ),
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let meta = fs::metadata(parent).map_err(|e| RasterError::io(parent, e))?;
            if !meta.is_dir() {
                return Err(RasterError::io(
                    parent,
                    std::io::Error::new(std::io::ErrorKind::Other, "parent is not a directory"),
                ));
            }
        }

        let len = spec.width * spec.height * spec.bands;
        let samples = match spec.band_type {
            BandType::Byte => Samples::Byte(vec![0; len]),
            BandType::Float32 => Samples::Float(vec![0.0; len]),
        };

        Ok(Self {
            path: path.to_path_buf(),
            width: spec.width,
            height: spec.height,
            bands: spec.bands,
            samples,
            geo_transform: None,
            spatial_ref: None,
            writable: true,
            dirty: true,
        })
    }

    fn check_band(&self, band: usize, len: usize) -> Result<(), RasterError> {
        if band >= self.bands {
            return Err(RasterError::BandOutOfRange {
                band,
                count: self.bands,
            });
        }
        let expected = self.width * self.height;
        if len != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), RasterError> {
        if self.writable {
            Ok(())
        } else {
            Err(RasterError::ReadOnly(self.path.clone()))
        }
    }

    fn encode<W: Write + Seek>(&self, writer: W) -> Result<(), TiffError> {
        let mut encoder = TiffEncoder::new(writer)?;
        let (width, height) = (self.width as u32, self.height as u32);

        match (&self.samples, self.bands) {
            (Samples::Byte(data), 3) => {
                let mut image = encoder.new_image::<RGB8>(width, height)?;
                write_geo_tags(image.encoder(), self.geo_transform, self.spatial_ref)?;
                image.write_data(data)
            }
            (Samples::Byte(data), _) => {
                let mut image = encoder.new_image::<Gray8>(width, height)?;
                write_geo_tags(image.encoder(), self.geo_transform, self.spatial_ref)?;
                image.write_data(data)
            }
            (Samples::Float(data), _) => {
                let mut image = encoder.new_image::<Gray32Float>(width, height)?;
                write_geo_tags(image.encoder(), self.geo_transform, self.spatial_ref)?;
                image.write_data(data)
            }
        }
    }
}

impl RasterDataset for GeoTiffDataset {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands
    }

    fn band_type(&self) -> BandType {
        match self.samples {
            Samples::Byte(_) => BandType::Byte,
            Samples::Float(_) => BandType::Float32,
        }
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn set_geo_transform(&mut self, transform: GeoTransform) -> Result<(), RasterError> {
        self.check_writable()?;
        self.geo_transform = Some(transform);
        self.dirty = true;
        Ok(())
    }

    fn spatial_ref(&self) -> Option<SpatialRef> {
        self.spatial_ref
    }

    fn set_spatial_ref(&mut self, srs: SpatialRef) -> Result<(), RasterError> {
        self.check_writable()?;
        self.spatial_ref = Some(srs);
        self.dirty = true;
        Ok(())
    }

    fn read_band_u8(&mut self, band: usize, buf: &mut [u8]) -> Result<(), RasterError> {
        self.check_band(band, buf.len())?;
        match &self.samples {
            Samples::Byte(data) => {
                for (dst, src) in buf.iter_mut().zip(data.iter().skip(band).step_by(self.bands)) {
                    *dst = *src;
                }
                Ok(())
            }
            Samples::Float(_) => Err(RasterError::BandTypeMismatch {
                dataset: BandType::Float32,
                requested: BandType::Byte,
            }),
        }
    }

    fn read_band_f32(&mut self, band: usize, buf: &mut [f32]) -> Result<(), RasterError> {
        self.check_band(band, buf.len())?;
        let stride = self.bands;
        match &self.samples {
            Samples::Float(data) => {
                for (dst, src) in buf.iter_mut().zip(data.iter().skip(band).step_by(stride)) {
                    *dst = *src;
                }
            }
            Samples::Byte(data) => {
                for (dst, src) in buf.iter_mut().zip(data.iter().skip(band).step_by(stride)) {
                    *dst = f32::from(*src);
                }
            }
        }
        Ok(())
    }

    fn write_band_u8(&mut self, band: usize, data: &[u8]) -> Result<(), RasterError> {
        self.check_writable()?;
        self.check_band(band, data.len())?;
        let stride = self.bands;
        match &mut self.samples {
            Samples::Byte(samples) => {
                for (dst, src) in samples.iter_mut().skip(band).step_by(stride).zip(data) {
                    *dst = *src;
                }
                self.dirty = true;
                Ok(())
            }
            Samples::Float(_) => Err(RasterError::BandTypeMismatch {
                dataset: BandType::Float32,
                requested: BandType::Byte,
            }),
        }
    }

    fn write_band_f32(&mut self, band: usize, data: &[f32]) -> Result<(), RasterError> {
        self.check_writable()?;
        self.check_band(band, data.len())?;
        let stride = self.bands;
        match &mut self.samples {
            Samples::Float(samples) => {
                for (dst, src) in samples.iter_mut().skip(band).step_by(stride).zip(data) {
                    *dst = *src;
                }
                self.dirty = true;
                Ok(())
            }
            Samples::Byte(_) => Err(RasterError::BandTypeMismatch {
                dataset: BandType::Byte,
                requested: BandType::Float32,
            }),
        }
    }

    fn flush(&mut self) -> Result<(), RasterError> {
        if !self.writable || !self.dirty {
            return Ok(());
        }

        // Write to a temp file first, then rename for atomicity
        let temp_path = temp_path_for(&self.path);
        let file = File::create(&temp_path).map_err(|e| RasterError::io(&temp_path, e))?;
        let mut writer = BufWriter::new(file);

        if let Err(e) = self.encode(&mut writer) {
            let _ = fs::remove_file(&temp_path);
            return Err(codec_error(&self.path)(e));
        }
        writer
            .flush()
            .map_err(|e| RasterError::io(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, &self.path).map_err(|e| RasterError::io(&self.path, e))?;
        self.dirty = false;

        tracing::trace!(path = %self.path.display(), "Wrote GeoTIFF");
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn codec_error(path: &Path) -> impl Fn(TiffError) -> RasterError + '_ {
    move |e| RasterError::Codec {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn read_geo_transform<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .find_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()??
        .into_f64_vec()
        .ok()?;
    let tiepoint = decoder
        .find_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .ok()??
        .into_f64_vec()
        .ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // Tiepoint is [I, J, K, X, Y, Z]: raster (I, J) sits at model (X, Y)
    let (sx, sy) = (scale[0], scale[1]);
    Some(GeoTransform {
        origin_x: tiepoint[3] - tiepoint[0] * sx,
        pixel_width: sx,
        row_rotation: 0.0,
        origin_y: tiepoint[4] + tiepoint[1] * sy,
        col_rotation: 0.0,
        pixel_height: -sy,
    })
}

fn read_spatial_ref<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Option<SpatialRef> {
    let keys = decoder
        .find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()??
        .into_u32_vec()
        .ok()?;

    // Header is 4 entries, then 4 entries per key: id, location, count, value
    keys.get(4..)?
        .chunks_exact(4)
        .find(|entry| entry[0] == u32::from(GEOGRAPHIC_TYPE_GEO_KEY) && entry[1] == 0)
        .and_then(|entry| u16::try_from(entry[3]).ok())
        .map(SpatialRef::from_epsg)
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    transform: Option<GeoTransform>,
    srs: Option<SpatialRef>,
) -> Result<(), TiffError> {
    if let Some(transform) = transform {
        let pixel_scale = [transform.pixel_width, transform.pixel_height.abs(), 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    }

    if let Some(srs) = srs {
        let geokeys: [u16; 16] = [
            1, 1, 0, 3, // version, revision, minor revision, key count
            GT_MODEL_TYPE_GEO_KEY,
            0,
            1,
            MODEL_TYPE_GEOGRAPHIC,
            GT_RASTER_TYPE_GEO_KEY,
            0,
            1,
            RASTER_PIXEL_IS_AREA,
            GEOGRAPHIC_TYPE_GEO_KEY,
            0,
            1,
            srs.epsg(),
        ];
        dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoExtent;
    use tempfile::TempDir;

    fn rgb_spec(size: usize) -> CreateSpec {
        CreateSpec {
            width: size,
            height: size,
            bands: 3,
            band_type: BandType::Byte,
        }
    }

    #[test]
    fn test_rgb_round_trip_with_georeferencing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rgb.tif");
        let extent = GeoExtent::new(11.0, 10.0, 21.0, 20.0).unwrap();
        let transform = GeoTransform::from_extent(&extent, 4, 4);

        let red: Vec<u8> = (0..16).collect();
        let green: Vec<u8> = (100..116).collect();
        let blue = vec![255u8; 16];

        let mut dataset = GeoTiffDataset::create(&path, &rgb_spec(4)).unwrap();
        dataset.set_geo_transform(transform).unwrap();
        dataset.set_spatial_ref(SpatialRef::WGS84).unwrap();
        dataset.write_band_u8(0, &red).unwrap();
        dataset.write_band_u8(1, &green).unwrap();
        dataset.write_band_u8(2, &blue).unwrap();
        dataset.flush().unwrap();

        let mut reopened = GeoTiffDataset::open(&path).unwrap();
        assert_eq!(reopened.width(), 4);
        assert_eq!(reopened.band_count(), 3);
        assert_eq!(reopened.band_type(), BandType::Byte);
        assert_eq!(reopened.geo_transform(), Some(transform));
        assert_eq!(reopened.spatial_ref(), Some(SpatialRef::WGS84));

        let mut band = vec![0u8; 16];
        reopened.read_band_u8(1, &mut band).unwrap();
        assert_eq!(band, green);
        reopened.read_band_u8(0, &mut band).unwrap();
        assert_eq!(band, red);
    }

    #[test]
    fn test_float_round_trip_is_exact() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dem.tif");
        let spec = CreateSpec {
            width: 3,
            height: 2,
            bands: 1,
            band_type: BandType::Float32,
        };
        let heights = vec![-11034.5, 0.0, 8848.86, 1.0e-7, f32::MIN_POSITIVE, 42.125];

        let mut dataset = GeoTiffDataset::create(&path, &spec).unwrap();
        dataset.write_band_f32(0, &heights).unwrap();
        dataset.flush().unwrap();

        let mut reopened = GeoTiffDataset::open(&path).unwrap();
        assert_eq!(reopened.geo_transform(), None);
        let mut band = vec![0f32; 6];
        reopened.read_band_f32(0, &mut band).unwrap();
        assert_eq!(band, heights);
    }

    #[test]
    fn test_opened_dataset_is_read_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ro.tif");
        let mut dataset = GeoTiffDataset::create(&path, &rgb_spec(2)).unwrap();
        dataset.flush().unwrap();

        let mut reopened = GeoTiffDataset::open(&path).unwrap();
        assert!(matches!(
            reopened.write_band_u8(0, &[0; 4]),
            Err(RasterError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_band_checks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("checks.tif");
        let mut dataset = GeoTiffDataset::create(&path, &rgb_spec(2)).unwrap();

        assert!(matches!(
            dataset.write_band_u8(3, &[0; 4]),
            Err(RasterError::BandOutOfRange { band: 3, count: 3 })
        ));
        assert!(matches!(
            dataset.write_band_u8(0, &[0; 3]),
            Err(RasterError::BufferSize {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            dataset.write_band_f32(0, &[0.0; 4]),
            Err(RasterError::BandTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = GeoTiffDataset::open(&temp.path().join("missing.tif"));
        assert!(matches!(result, Err(RasterError::Io { .. })));
    }

    #[test]
    fn test_open_garbage_is_codec_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("garbage.tif");
        fs::write(&path, b"definitely not a tiff").unwrap();
        assert!(matches!(
            GeoTiffDataset::open(&path),
            Err(RasterError::Codec { .. })
        ));
    }

    #[test]
    fn test_create_rejects_unsupported_layout() {
        let temp = TempDir::new().unwrap();
        let spec = CreateSpec {
            width: 2,
            height: 2,
            bands: 3,
            band_type: BandType::Float32,
        };
        assert!(matches!(
            GeoTiffDataset::create(&temp.path().join("x.tif"), &spec),
            Err(RasterError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_create_requires_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("x.tif");
        assert!(matches!(
            GeoTiffDataset::create(&path, &rgb_spec(2)),
            Err(RasterError::Io { .. })
        ));
    }

    #[test]
    fn test_flush_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clean.tif");
        let mut dataset = GeoTiffDataset::create(&path, &rgb_spec(2)).unwrap();
        dataset.flush().unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }
}
