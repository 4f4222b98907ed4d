//! TIFF raster decoder

use std::path::Path;

use tiff::decoder::DecodingResult;
use tiff::tags::Tag;

use super::{split_description, widen, widen_with};
use crate::error::StretchError;
use crate::raster::{Raster, RasterDataType};

/// GDAL's private tag holding the no-data value as ASCII.
pub(crate) const GDAL_NODATA_TAG: u16 = 42113;

fn decode_error(context: &str, e: impl std::fmt::Display) -> StretchError {
    StretchError::Decode(format!("{}: {}", context, e))
}

/// Decode a single-band TIFF file
pub(crate) fn decode_tiff(path: &Path, default_nodata: f64) -> Result<Raster, StretchError> {
    use std::fs::File;
    use std::io::BufReader;
    use tiff::decoder::Limits;

    let file = File::open(path)
        .map_err(|e| decode_error(&format!("Failed to open {}", path.display()), e))?;

    // Large single-band grids (up to 1GB uncompressed)
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 64 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;

    let mut decoder = tiff::decoder::Decoder::new(BufReader::new(file))
        .map_err(|e| decode_error("Failed to create TIFF decoder", e))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| decode_error("Failed to get TIFF dimensions", e))?;

    let color_type = decoder
        .colortype()
        .map_err(|e| decode_error("Failed to get TIFF color type", e))?;
    if !matches!(color_type, tiff::ColorType::Gray(_)) {
        return Err(StretchError::Decode(format!(
            "Only single-band rasters are supported, got {:?}",
            color_type
        )));
    }

    let nodata = read_ascii_tag(&mut decoder, Tag::from_u16_exhaustive(GDAL_NODATA_TAG))?
        .and_then(|text| match text.trim().trim_end_matches('\0').parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring unparsable no-data value '{}'", text);
                None
            }
        })
        .unwrap_or(default_nodata);
    let description = read_ascii_tag(&mut decoder, Tag::ImageDescription)?;

    let image_data = decoder
        .read_image()
        .map_err(|e| decode_error("Failed to read TIFF image data", e))?;

    let (data, data_type) = match image_data {
        DecodingResult::U8(buf) => (widen(&buf)?, RasterDataType::I16),
        DecodingResult::I8(buf) => (widen(&buf)?, RasterDataType::I16),
        DecodingResult::I16(buf) => (widen(&buf)?, RasterDataType::I16),
        DecodingResult::U16(buf) => (widen(&buf)?, RasterDataType::I32),
        DecodingResult::I32(buf) => (widen(&buf)?, RasterDataType::I32),
        DecodingResult::U32(buf) => (widen(&buf)?, RasterDataType::F64),
        DecodingResult::U64(buf) => (widen(&buf)?, RasterDataType::F64),
        DecodingResult::I64(buf) => (widen(&buf)?, RasterDataType::F64),
        DecodingResult::F16(buf) => (widen_with(&buf, |v| v.to_f64())?, RasterDataType::F32),
        DecodingResult::F32(buf) => (widen(&buf)?, RasterDataType::F32),
        DecodingResult::F64(buf) => (widen(&buf)?, RasterDataType::F64),
    };

    let mut raster = Raster::from_data(height as usize, width as usize, nodata, data, data_type)
        .map_err(|e| decode_error("TIFF buffer does not match its dimensions", e))?;

    if let Some(description) = description {
        let (palette, metadata) = split_description(&description);
        raster.palette = palette;
        raster.metadata = metadata;
    }

    log::debug!(
        "Decoded {}: {}x{} {:?}, no-data {}",
        path.display(),
        height,
        width,
        data_type,
        nodata
    );
    Ok(raster)
}

fn read_ascii_tag<R: std::io::Read + std::io::Seek>(
    decoder: &mut tiff::decoder::Decoder<R>,
    tag: Tag,
) -> Result<Option<String>, StretchError> {
    let value = decoder
        .find_tag(tag)
        .map_err(|e| decode_error(&format!("Failed to read TIFF tag {:?}", tag), e))?;
    match value {
        Some(value) => value
            .into_string()
            .map(Some)
            .map_err(|e| decode_error(&format!("TIFF tag {:?} is not text", tag), e)),
        None => Ok(None),
    }
}
