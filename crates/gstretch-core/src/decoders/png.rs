//! PNG raster decoder (grayscale only)

use std::path::Path;

use super::widen;
use crate::error::{try_filled_vec, StretchError};
use crate::raster::{Raster, RasterDataType};

/// Decode a grayscale PNG file. PNG has no no-data concept, so every cell is
/// valid and the raster carries `default_nodata`.
pub(crate) fn decode_png(path: &Path, default_nodata: f64) -> Result<Raster, StretchError> {
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(path)
        .map_err(|e| StretchError::Decode(format!("Failed to open {}: {}", path.display(), e)))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder
        .read_info()
        .map_err(|e| StretchError::Decode(format!("Failed to read PNG info: {}", e)))?;

    let width = reader.info().width as usize;
    let height = reader.info().height as usize;
    let (color_type, bit_depth) = reader.output_color_type();

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| StretchError::Decode("Failed to determine PNG buffer size".to_string()))?;
    let mut buf = try_filled_vec(buffer_size, 0u8, "PNG frame buffer")?;
    let frame_info = reader
        .next_frame(&mut buf)
        .map_err(|e| StretchError::Decode(format!("Failed to read PNG frame: {}", e)))?;
    let bytes = &buf[..frame_info.buffer_size()];

    let (data, data_type) = match (color_type, bit_depth) {
        (png::ColorType::Grayscale, png::BitDepth::Eight) => {
            check_len(bytes.len(), width * height)?;
            (widen(bytes)?, RasterDataType::I16)
        }
        (png::ColorType::Grayscale, png::BitDepth::Sixteen) => {
            check_len(bytes.len(), width * height * 2)?;
            // PNG 16-bit is big-endian
            let mut data = try_filled_vec(width * height, 0.0, "input raster")?;
            for (cell, chunk) in data.iter_mut().zip(bytes.chunks_exact(2)) {
                *cell = u16::from_be_bytes([chunk[0], chunk[1]]) as f64;
            }
            (data, RasterDataType::I32)
        }
        _ => {
            return Err(StretchError::Decode(format!(
                "Only 8- or 16-bit grayscale PNG is supported, got {:?} with bit depth {:?}",
                color_type, bit_depth
            )));
        }
    };

    Raster::from_data(height, width, default_nodata, data, data_type)
}

fn check_len(actual: usize, expected: usize) -> Result<(), StretchError> {
    if actual != expected {
        return Err(StretchError::Decode(format!(
            "PNG buffer size mismatch: expected {}, got {}",
            expected, actual
        )));
    }
    Ok(())
}
