//! Empirical histogram and CDF of the input raster

use crate::error::{try_filled_vec, StretchError};
use crate::host::{PassProgress, ToolHost};
use crate::raster::Raster;

use super::parallel::try_fold_rows;

pub(crate) const HISTOGRAM_LABEL: &str = "Loop 1 of 3: ";

/// Fixed-resolution histogram of the valid cells of a raster.
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: Vec<u64>,
    min_value: f64,
    bin_size: f64,
    num_cells: u64,
}

impl Histogram {
    /// Empty histogram of `num_bins` bins spanning `[min_value, max_value]`.
    ///
    /// A zero-width range (constant raster) uses a unit bin size so every
    /// valid value lands in bin 0.
    pub fn new(num_bins: usize, min_value: f64, max_value: f64) -> Result<Self, StretchError> {
        let bin_size = bin_size_for(num_bins, min_value, max_value)?;
        Ok(Self {
            counts: try_filled_vec(num_bins, 0, "histogram")?,
            min_value,
            bin_size,
            num_cells: 0,
        })
    }

    /// Bin holding `value`, clamped to the histogram.
    #[inline]
    pub fn bin_index(&self, value: f64) -> usize {
        bin_index(value, self.min_value, self.bin_size, self.counts.len())
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Number of valid cells counted.
    pub fn num_cells(&self) -> u64 {
        self.num_cells
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }
}

fn bin_size_for(num_bins: usize, min_value: f64, max_value: f64) -> Result<f64, StretchError> {
    if num_bins == 0 {
        return Err(StretchError::config("Histogram needs at least one bin"));
    }
    if !min_value.is_finite() || !max_value.is_finite() {
        return Err(StretchError::config(format!(
            "Raster value range must be finite, got [{}, {}]",
            min_value, max_value
        )));
    }
    if min_value > max_value {
        return Err(StretchError::config(format!(
            "Minimum value {} exceeds maximum value {}",
            min_value, max_value
        )));
    }

    let bin_size = (max_value - min_value) / num_bins as f64;
    Ok(if bin_size > 0.0 { bin_size } else { 1.0 })
}

#[inline]
fn bin_index(value: f64, min_value: f64, bin_size: f64, num_bins: usize) -> usize {
    let bin = ((value - min_value) / bin_size).floor();
    let last = num_bins - 1;
    if !(bin > 0.0) {
        0
    } else if bin >= last as f64 {
        last
    } else {
        bin as usize
    }
}

/// Per-worker partial counts. The count buffer is allocated on first use.
#[derive(Default)]
struct PartialCounts {
    counts: Vec<u64>,
    cells: u64,
}

impl PartialCounts {
    fn merge(mut self, other: PartialCounts) -> PartialCounts {
        if self.counts.is_empty() {
            return PartialCounts {
                counts: other.counts,
                cells: self.cells + other.cells,
            };
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.cells += other.cells;
        self
    }
}

/// Scan every row of `raster` and bin its valid cells.
///
/// Rows are processed in parallel when there are at least `parallel_threshold`
/// of them; each worker fills its own partial histogram and the partials are
/// summed. Cancellation is polled once per row.
pub fn build_histogram(
    raster: &Raster,
    num_bins: usize,
    (min_value, max_value): (f64, f64),
    parallel_threshold: usize,
    host: &dyn ToolHost,
) -> Result<Histogram, StretchError> {
    let mut histogram = Histogram::new(num_bins, min_value, max_value)?;
    let bin_size = histogram.bin_size;
    let progress = PassProgress::start(host, HISTOGRAM_LABEL, raster.rows());

    let partial = try_fold_rows(
        raster.rows(),
        parallel_threshold,
        PartialCounts::default,
        |mut acc, row| {
            progress.check_cancelled()?;
            if acc.counts.is_empty() {
                acc.counts = try_filled_vec(num_bins, 0, "histogram")?;
            }
            for &value in raster.row(row) {
                if raster.is_nodata(value) {
                    continue;
                }
                acc.counts[bin_index(value, min_value, bin_size, num_bins)] += 1;
                acc.cells += 1;
            }
            progress.row_done();
            Ok(acc)
        },
        PartialCounts::merge,
    )?;

    if !partial.counts.is_empty() {
        histogram.counts = partial.counts;
    }
    histogram.num_cells = partial.cells;
    Ok(histogram)
}

/// Normalized cumulative distribution of a [`Histogram`].
#[derive(Debug, Clone)]
pub struct EmpiricalCdf {
    values: Vec<f64>,
}

impl EmpiricalCdf {
    /// Prefix sum of the counts divided by the number of valid cells.
    ///
    /// With no valid cells every entry stays 0.
    pub fn from_histogram(histogram: &Histogram) -> Result<Self, StretchError> {
        let mut values = try_filled_vec(histogram.num_bins(), 0.0, "empirical CDF")?;
        if histogram.num_cells == 0 {
            return Ok(Self { values });
        }

        let total = histogram.num_cells as f64;
        let mut running = 0u64;
        for (value, &count) in values.iter_mut().zip(&histogram.counts) {
            running += count;
            *value = running as f64 / total;
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cumulative probability of histogram bin `bin`.
    #[inline]
    pub fn probability(&self, bin: usize) -> f64 {
        self.values[bin]
    }
}
