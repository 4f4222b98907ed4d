//! Gaussian contrast stretch
//!
//! Histogram matching of a single-band raster against a truncated normal
//! distribution. The work is split into passes:
//! - `histogram`: empirical histogram and CDF of the valid cells
//! - `reference`: discretized Gaussian CDF and its decile search table
//! - `matching`: quantile inversion from empirical probability to output bin
//! - `parallel`: row-parallel dispatch shared by the passes

mod histogram;
mod matching;
mod parallel;
mod reference;

#[cfg(test)]
mod tests;

pub use histogram::{build_histogram, EmpiricalCdf, Histogram};
pub use matching::{match_raster, MatchStrategy, QuantileMatcher};
pub use reference::{DecileTable, ReferenceCdf};

use std::time::{Duration, Instant};

use crate::config::{StretchDefaults, DEFAULT_HISTOGRAM_BINS};
use crate::error::StretchError;
use crate::host::ToolHost;
use crate::raster::{Raster, RasterDataType};

pub(crate) const CDF_LABEL: &str = "Loop 2 of 3: ";

/// Parameters of a single stretch.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchParams {
    /// Half-width of the reference distribution, in standard deviations
    pub cutoff_sd: f64,

    /// Output values range over `0..num_output_bins`
    pub num_output_bins: usize,

    /// Resolution of the empirical histogram
    pub histogram_bins: usize,

    pub match_strategy: MatchStrategy,

    /// Minimum row count for parallel passes
    pub parallel_row_threshold: usize,

    /// Output no-data when the input sentinel does not fit an integer cell
    pub fallback_nodata: f64,
}

impl Default for StretchParams {
    fn default() -> Self {
        Self::from_defaults(&StretchDefaults::default())
    }
}

impl StretchParams {
    pub fn from_defaults(defaults: &StretchDefaults) -> Self {
        Self {
            cutoff_sd: defaults.cutoff_sd,
            num_output_bins: defaults.num_output_bins,
            histogram_bins: defaults.histogram_bins,
            match_strategy: defaults.match_strategy,
            parallel_row_threshold: defaults.parallel_row_threshold,
            fallback_nodata: defaults.default_nodata,
        }
    }

    pub fn validate(&self) -> Result<(), StretchError> {
        if !self.cutoff_sd.is_finite() || self.cutoff_sd <= 0.0 {
            return Err(StretchError::config(format!(
                "Cutoff must be a positive number of standard deviations, got {}",
                self.cutoff_sd
            )));
        }
        if self.num_output_bins < 2 {
            return Err(StretchError::config(format!(
                "Number of output bins must be at least 2, got {}",
                self.num_output_bins
            )));
        }
        if self.num_output_bins > i32::MAX as usize {
            return Err(StretchError::config(format!(
                "Number of output bins must fit in a 32-bit cell, got {}",
                self.num_output_bins
            )));
        }
        if self.histogram_bins == 0 {
            return Err(StretchError::config(format!(
                "Histogram needs at least one bin (default {})",
                DEFAULT_HISTOGRAM_BINS
            )));
        }
        if !self.fallback_nodata.is_finite()
            || self.fallback_nodata.fract() != 0.0
            || self.fallback_nodata < i32::MIN as f64
            || self.fallback_nodata > i32::MAX as f64
        {
            return Err(StretchError::config(format!(
                "Default no-data value {} cannot be stored in a 32-bit integer cell",
                self.fallback_nodata
            )));
        }
        if self.fallback_nodata >= 0.0 && self.fallback_nodata < self.num_output_bins as f64 {
            return Err(StretchError::config(format!(
                "Default no-data value {} falls inside the output range 0..{}",
                self.fallback_nodata, self.num_output_bins
            )));
        }
        Ok(())
    }
}

/// No-data value of the integer output raster.
///
/// The input sentinel is kept when an `i32` cell can hold it exactly and it
/// does not collide with an output bin index.
pub fn output_nodata(input_nodata: f64, num_output_bins: usize, fallback: f64) -> f64 {
    let collides = input_nodata >= 0.0 && input_nodata < num_output_bins as f64;
    if input_nodata.is_finite()
        && input_nodata.fract() == 0.0
        && input_nodata >= i32::MIN as f64
        && input_nodata <= i32::MAX as f64
        && !collides
    {
        input_nodata
    } else {
        fallback
    }
}

/// Result of [`gaussian_stretch`].
#[derive(Debug)]
pub struct StretchOutput {
    /// Output raster (`I32` cells holding bin indices)
    pub raster: Raster,

    /// Number of valid input cells
    pub valid_cells: u64,

    /// Minimum and maximum of the valid input cells
    pub value_range: Option<(f64, f64)>,

    pub elapsed: Duration,
}

/// Remap every valid cell of `input` so the output distribution follows a
/// normal distribution truncated at `params.cutoff_sd`.
///
/// Output cells are bin indices in `0..params.num_output_bins`; no-data cells
/// stay no-data. Returns [`StretchError::Cancelled`] when the host cancels.
pub fn gaussian_stretch(
    input: &Raster,
    params: &StretchParams,
    host: &dyn ToolHost,
) -> Result<StretchOutput, StretchError> {
    params.validate()?;
    let start = Instant::now();

    let value_range = input.value_range();
    if value_range.is_none() {
        log::warn!("Input raster has no valid cells; output will be all no-data");
    }
    let (min_value, max_value) = value_range.unwrap_or((0.0, 0.0));
    log::debug!(
        "Stretching {}x{} raster: range [{}, {}], cutoff {} SD, {} output bins, {} strategy",
        input.rows(),
        input.columns(),
        min_value,
        max_value,
        params.cutoff_sd,
        params.num_output_bins,
        params.match_strategy
    );

    let histogram = build_histogram(
        input,
        params.histogram_bins,
        (min_value, max_value),
        params.parallel_row_threshold,
        host,
    )?;
    log::debug!(
        "Histogram: {} valid cells in {:?}",
        histogram.num_cells(),
        start.elapsed()
    );

    host.update_progress(CDF_LABEL, 0);
    if host.is_cancelled() {
        return Err(StretchError::Cancelled);
    }
    let (cdf, reference) = rayon::join(
        || EmpiricalCdf::from_histogram(&histogram),
        || ReferenceCdf::gaussian(params.num_output_bins, params.cutoff_sd),
    );
    let (cdf, reference) = (cdf?, reference?);
    host.update_progress(CDF_LABEL, 100);

    let matcher = QuantileMatcher::new(&reference, params.match_strategy);
    let nodata = output_nodata(input.nodata(), params.num_output_bins, params.fallback_nodata);
    let mut output = Raster::initialize_using(input, RasterDataType::I32, nodata)?;

    match_raster(
        input,
        &histogram,
        &cdf,
        &matcher,
        &mut output,
        params.parallel_row_threshold,
        host,
    )?;

    let elapsed = start.elapsed();
    log::debug!("Stretch finished in {:?}", elapsed);

    Ok(StretchOutput {
        raster: output,
        valid_cells: histogram.num_cells(),
        value_range,
        elapsed,
    })
}
