use serde::Serialize;
use std::path::PathBuf;

use gstretch_core::config::stretch_config_handle;
use gstretch_core::decoders::decode_raster;
use gstretch_core::Raster;

/// Raster summary for JSON output.
#[derive(Serialize)]
pub struct RasterInfo {
    pub file: String,
    pub rows: usize,
    pub columns: usize,
    pub data_type: String,
    pub nodata: f64,
    pub valid_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    pub metadata: Vec<String>,
}

impl RasterInfo {
    pub fn from_raster(file: &str, raster: &Raster) -> Self {
        let range = raster.value_range();
        Self {
            file: file.to_string(),
            rows: raster.rows(),
            columns: raster.columns(),
            data_type: format!("{:?}", raster.data_type),
            nodata: raster.nodata(),
            valid_cells: raster.valid_cell_count(),
            min: range.map(|(min, _)| min),
            max: range.map(|(_, max)| max),
            palette: raster.palette.clone(),
            metadata: raster.metadata.clone(),
        }
    }
}

/// Print dimensions, no-data value and value range of a raster.
pub fn cmd_info(input: PathBuf, json: bool, config: Option<PathBuf>) -> Result<(), String> {
    let handle = stretch_config_handle(config.as_deref());
    let raster = decode_raster(&input, handle.config.defaults.default_nodata)
        .map_err(|e| e.to_string())?;
    let info = RasterInfo::from_raster(&input.display().to_string(), &raster);

    if json {
        let text = serde_json::to_string_pretty(&info)
            .map_err(|e| format!("Failed to serialize raster info: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    println!("File:        {}", info.file);
    println!("Dimensions:  {} rows x {} columns", info.rows, info.columns);
    println!("Data type:   {}", info.data_type);
    println!("No-data:     {}", info.nodata);
    println!("Valid cells: {}", info.valid_cells);
    match (info.min, info.max) {
        (Some(min), Some(max)) => println!("Value range: {} to {}", min, max),
        _ => println!("Value range: (no valid cells)"),
    }
    if let Some(palette) = &info.palette {
        println!("Palette:     {}", palette);
    }
    if !info.metadata.is_empty() {
        println!("Metadata:");
        for entry in &info.metadata {
            println!("  {}", entry);
        }
    }
    Ok(())
}
