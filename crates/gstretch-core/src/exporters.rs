//! Raster exporters
//!
//! Writes single-band TIFF files. The raster's palette and metadata entries
//! go to `ImageDescription` (one per line) and the no-data value to GDAL's
//! no-data tag, so [`crate::decoders::decode_raster`] can read them back.

use std::io::{Seek, Write};
use std::path::Path;

use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::decoders::{GDAL_NODATA_TAG, PALETTE_ENTRY_PREFIX};
use crate::error::StretchError;
use crate::raster::{Raster, RasterDataType};

fn export_error(context: &str, e: impl std::fmt::Display) -> StretchError {
    StretchError::Export(format!("{}: {}", context, e))
}

/// Text tags written alongside the samples.
struct TextTags {
    description: Option<String>,
    software: Option<String>,
    nodata: String,
}

/// Export a raster to TIFF, using its data type for the sample format.
///
/// `software` is recorded in the TIFF `Software` tag when given.
pub fn export_raster<P: AsRef<Path>>(
    raster: &Raster,
    path: P,
    software: Option<&str>,
) -> Result<(), StretchError> {
    use std::fs::File;
    use std::io::BufWriter;

    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| export_error(&format!("Failed to create {}", path.display()), e))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))
        .map_err(|e| export_error("Failed to create TIFF encoder", e))?;

    let tags = TextTags {
        description: description_for(raster),
        software: software.map(ascii_only),
        nodata: format_nodata(raster.nodata(), raster.data_type),
    };

    let data = raster.data();
    match raster.data_type {
        RasterDataType::I16 => {
            let samples: Vec<i16> = data.iter().map(|&v| v.round() as i16).collect();
            write_image::<colortype::GrayI16, _>(&mut encoder, raster, &tags, &samples)?;
        }
        RasterDataType::I32 => {
            let samples: Vec<i32> = data.iter().map(|&v| v.round() as i32).collect();
            write_image::<colortype::GrayI32, _>(&mut encoder, raster, &tags, &samples)?;
        }
        RasterDataType::F32 => {
            let samples: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            write_image::<colortype::Gray32Float, _>(&mut encoder, raster, &tags, &samples)?;
        }
        RasterDataType::F64 => {
            write_image::<colortype::Gray64Float, _>(&mut encoder, raster, &tags, data)?;
        }
    }

    log::debug!(
        "Wrote {}: {}x{} {:?}",
        path.display(),
        raster.rows(),
        raster.columns(),
        raster.data_type
    );
    Ok(())
}

fn write_image<C, W>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster,
    tags: &TextTags,
    samples: &[C::Inner],
) -> Result<(), StretchError>
where
    C: colortype::ColorType,
    W: Write + Seek,
    [C::Inner]: TiffValue,
{
    let width = u32::try_from(raster.columns())
        .map_err(|_| StretchError::Export("Raster is too wide for TIFF".to_string()))?;
    let height = u32::try_from(raster.rows())
        .map_err(|_| StretchError::Export("Raster is too tall for TIFF".to_string()))?;

    let mut image = encoder
        .new_image::<C>(width, height)
        .map_err(|e| export_error("Failed to start TIFF image", e))?;

    let directory = image.encoder();
    if let Some(description) = &tags.description {
        directory
            .write_tag(Tag::ImageDescription, description.as_str())
            .map_err(|e| export_error("Failed to write ImageDescription", e))?;
    }
    if let Some(software) = &tags.software {
        directory
            .write_tag(Tag::Software, software.as_str())
            .map_err(|e| export_error("Failed to write Software tag", e))?;
    }
    directory
        .write_tag(
            Tag::from_u16_exhaustive(GDAL_NODATA_TAG),
            tags.nodata.as_str(),
        )
        .map_err(|e| export_error("Failed to write no-data tag", e))?;

    image
        .write_data(samples)
        .map_err(|e| export_error("Failed to write TIFF image data", e))
}

/// Palette line followed by the metadata entries, or `None` when both are empty.
fn description_for(raster: &Raster) -> Option<String> {
    let mut lines = Vec::with_capacity(raster.metadata.len() + 1);
    if let Some(palette) = &raster.palette {
        lines.push(format!("{}{}", PALETTE_ENTRY_PREFIX, palette));
    }
    lines.extend(
        raster
            .metadata
            .iter()
            .map(|entry| entry.replace(['\r', '\n'], " ")),
    );
    if lines.is_empty() {
        None
    } else {
        Some(ascii_only(&lines.join("\n")))
    }
}

/// TIFF ASCII fields must be 7-bit.
fn ascii_only(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && c != '\0' { c } else { '?' })
        .collect()
}

fn format_nodata(nodata: f64, data_type: RasterDataType) -> String {
    if data_type.is_integer() && nodata.is_finite() {
        format!("{}", nodata.round() as i64)
    } else {
        format!("{}", nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::decode_raster;
    use tempfile::tempdir;

    #[test]
    fn test_export_and_decode_integer_raster() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stretched.tif");

        let mut raster = Raster::from_data(
            2,
            3,
            -32768.0,
            vec![0.0, 511.0, 1023.0, -32768.0, 12.0, 700.0],
            RasterDataType::I32,
        )
        .unwrap();
        raster.palette = Some("grey.plt".to_string());
        raster.add_metadata_entry("Created by the Gaussian Contrast Stretch tool.");
        raster.add_metadata_entry("Cutoff: 3 SD");

        export_raster(&raster, &path, Some("GaussianStretch")).unwrap();
        let decoded = decode_raster(&path, -1.0).unwrap();

        assert_eq!(decoded.rows(), 2);
        assert_eq!(decoded.columns(), 3);
        assert_eq!(decoded.data_type, RasterDataType::I32);
        assert_eq!(decoded.nodata(), -32768.0);
        assert_eq!(decoded.data(), raster.data());
        assert_eq!(decoded.palette.as_deref(), Some("grey.plt"));
        assert_eq!(decoded.metadata, raster.metadata);
        assert_eq!(decoded.valid_cell_count(), 5);
    }

    #[test]
    fn test_float_raster_keeps_nan_nodata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dem.tif");

        let raster = Raster::from_data(
            1,
            3,
            f64::NAN,
            vec![1.25, f64::NAN, -7.5],
            RasterDataType::F32,
        )
        .unwrap();

        export_raster(&raster, &path, None).unwrap();
        let decoded = decode_raster(&path, -32768.0).unwrap();

        assert!(decoded.nodata().is_nan());
        assert_eq!(decoded.data_type, RasterDataType::F32);
        assert_eq!(decoded.value_range(), Some((-7.5, 1.25)));
        assert!(decoded.metadata.is_empty());
        assert!(decoded.palette.is_none());
    }

    #[test]
    fn test_non_ascii_metadata_is_replaced() {
        let mut raster =
            Raster::from_data(1, 1, -1.0, vec![1.0], RasterDataType::I16).unwrap();
        raster.add_metadata_entry("Input file: /data/höhe.tif");
        raster.add_metadata_entry("two\nlines");

        let description = description_for(&raster).unwrap();
        assert_eq!(description, "Input file: /data/h?he.tif\ntwo lines");
    }

    #[test]
    fn test_format_nodata() {
        assert_eq!(format_nodata(-9999.0, RasterDataType::I32), "-9999");
        assert_eq!(format_nodata(-3.5, RasterDataType::F64), "-3.5");
        assert_eq!(format_nodata(f64::NAN, RasterDataType::F32), "NaN");
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tif");
        let raster = Raster::from_data(1, 1, -1.0, vec![1.0], RasterDataType::I32).unwrap();

        let result = export_raster(&raster, &path, None);
        assert!(matches!(result, Err(StretchError::Export(_))));
    }
}
