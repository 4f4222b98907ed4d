//! In-memory single-band raster
//!
//! Rows are stored back to back (row-major) as `f64` regardless of the cell
//! type the raster is written with. Missing cells hold the no-data sentinel;
//! NaN and infinite samples are treated as missing too.

use crate::error::{try_filled_vec, StretchError};

/// Cell type used when the raster is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterDataType {
    I16,
    I32,
    F32,
    F64,
}

impl RasterDataType {
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I16 | Self::I32)
    }
}

/// Single-band raster grid with a no-data sentinel.
#[derive(Debug, Clone)]
pub struct Raster {
    rows: usize,
    columns: usize,
    nodata: f64,
    data: Vec<f64>,

    /// Cell type used by the exporter
    pub data_type: RasterDataType,

    /// Preferred display palette, carried from input to output
    pub palette: Option<String>,

    /// Human-readable metadata entries, one per line in the written file
    pub metadata: Vec<String>,
}

impl Raster {
    /// Create a raster with every cell set to `nodata`.
    pub fn new(
        rows: usize,
        columns: usize,
        nodata: f64,
        data_type: RasterDataType,
    ) -> Result<Self, StretchError> {
        if rows == 0 || columns == 0 {
            return Err(StretchError::config(format!(
                "Raster dimensions must be at least 1x1, got {}x{}",
                rows, columns
            )));
        }
        let len = rows
            .checked_mul(columns)
            .ok_or(StretchError::OutOfMemory {
                what: "raster buffer",
            })?;
        let data = try_filled_vec(len, nodata, "raster buffer")?;
        Ok(Self {
            rows,
            columns,
            nodata,
            data,
            data_type,
            palette: None,
            metadata: Vec::new(),
        })
    }

    /// Wrap existing row-major samples.
    pub fn from_data(
        rows: usize,
        columns: usize,
        nodata: f64,
        data: Vec<f64>,
        data_type: RasterDataType,
    ) -> Result<Self, StretchError> {
        if rows == 0 || columns == 0 {
            return Err(StretchError::config(format!(
                "Raster dimensions must be at least 1x1, got {}x{}",
                rows, columns
            )));
        }
        if rows.checked_mul(columns) != Some(data.len()) {
            return Err(StretchError::config(format!(
                "Raster buffer size mismatch: expected {}x{}, got {} samples",
                rows,
                columns,
                data.len()
            )));
        }
        Ok(Self {
            rows,
            columns,
            nodata,
            data,
            data_type,
            palette: None,
            metadata: Vec::new(),
        })
    }

    /// Create an empty (all no-data) raster with the dimensions and palette of `reference`.
    pub fn initialize_using(
        reference: &Raster,
        data_type: RasterDataType,
        nodata: f64,
    ) -> Result<Self, StretchError> {
        let mut raster = Self::new(reference.rows, reference.columns, nodata, data_type)?;
        raster.palette = reference.palette.clone();
        Ok(raster)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    /// Number of cells (`rows * columns`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when `value` is the no-data sentinel or not finite.
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        value == self.nodata || !value.is_finite()
    }

    /// Samples of one row.
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.columns;
        &self.data[start..start + self.columns]
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.data[row * self.columns + column]
    }

    pub fn set_value(&mut self, row: usize, column: usize, value: f64) {
        self.data[row * self.columns + column] = value;
    }

    /// All samples, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major samples; chunk by [`Raster::columns`] for per-row access.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn add_metadata_entry(&mut self, entry: impl Into<String>) {
        self.metadata.push(entry.into());
    }

    /// Minimum and maximum of the valid cells, or `None` when every cell is no-data.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for &value in &self.data {
            if self.is_nodata(value) {
                continue;
            }
            range = Some(match range {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
        }
        range
    }

    /// Number of cells that are not no-data.
    pub fn valid_cell_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }
}
