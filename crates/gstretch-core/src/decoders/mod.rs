//! Raster decoders
//!
//! Single-band TIFF (any sample type) and grayscale PNG.

mod png;
mod tiff;


use std::path::Path;

use crate::error::{try_filled_vec, StretchError};
use crate::raster::Raster;

pub(crate) use self::tiff::GDAL_NODATA_TAG;

/// Metadata line holding the preferred palette name.
pub(crate) const PALETTE_ENTRY_PREFIX: &str = "Palette: ";

/// Decode a single-band raster from a file path.
///
/// `default_nodata` is used when the file does not record a no-data value.
pub fn decode_raster<P: AsRef<Path>>(path: P, default_nodata: f64) -> Result<Raster, StretchError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            StretchError::Decode(format!("No file extension found: {}", path.display()))
        })?;

    match extension.as_str() {
        "tif" | "tiff" => self::tiff::decode_tiff(path, default_nodata),
        "png" => self::png::decode_png(path, default_nodata),
        _ => Err(StretchError::Decode(format!(
            "Unsupported file format: {}",
            extension
        ))),
    }
}

/// True for extensions [`decode_raster`] accepts.
pub fn is_supported_extension(extension: &str) -> bool {
    matches!(
        extension.to_lowercase().as_str(),
        "tif" | "tiff" | "png"
    )
}

/// Sample types that can be widened to `f64` without scaling.
trait RasterSample: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_raster_sample {
    ($($t:ty),*) => {
        $(
            impl RasterSample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_raster_sample!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

fn widen<T: RasterSample>(buf: &[T]) -> Result<Vec<f64>, StretchError> {
    widen_with(buf, T::to_f64)
}

/// Convert decoded samples into a raster buffer, reporting allocation failure.
fn widen_with<T: Copy>(buf: &[T], convert: impl Fn(T) -> f64) -> Result<Vec<f64>, StretchError> {
    let mut data = try_filled_vec(buf.len(), 0.0, "input raster")?;
    for (cell, &value) in data.iter_mut().zip(buf) {
        *cell = convert(value);
    }
    Ok(data)
}

/// Split description lines into the palette name and plain metadata entries.
fn split_description(description: &str) -> (Option<String>, Vec<String>) {
    let mut palette = None;
    let mut metadata = Vec::new();
    for line in description.lines() {
        let line = line.trim_end_matches('\0').trim_end();
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix(PALETTE_ENTRY_PREFIX) {
            Some(name) => palette = Some(name.trim().to_string()),
            None => metadata.push(line.to_string()),
        }
    }
    (palette, metadata)
}
