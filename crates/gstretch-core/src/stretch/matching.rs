//! Quantile inversion: empirical probability to reference bin

use serde::{Deserialize, Serialize};

use crate::error::StretchError;
use crate::host::{PassProgress, ToolHost};
use crate::raster::Raster;

use super::histogram::{EmpiricalCdf, Histogram};
use super::parallel::try_for_each_row_mut;
use super::reference::{DecileTable, ReferenceCdf};

pub(crate) const MATCHING_LABEL: &str = "Loop 3 of 3: ";

/// How the matched reference bin is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Binary search over the reference CDF
    #[default]
    Binary,
    /// Linear scan starting at the decile table entry for the probability
    DecileScan,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStrategy::Binary => write!(f, "binary"),
            MatchStrategy::DecileScan => write!(f, "decile-scan"),
        }
    }
}

impl std::str::FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(MatchStrategy::Binary),
            "decile-scan" | "decile" | "scan" => Ok(MatchStrategy::DecileScan),
            other => Err(format!(
                "Unknown match strategy '{}'. Expected 'binary' or 'decile-scan'",
                other
            )),
        }
    }
}

/// Maps a cumulative probability to the last reference bin at or below it.
#[derive(Debug, Clone)]
pub struct QuantileMatcher<'a> {
    reference: &'a [f64],
    strategy: MatchStrategy,
    deciles: DecileTable,
}

impl<'a> QuantileMatcher<'a> {
    pub fn new(reference: &'a ReferenceCdf, strategy: MatchStrategy) -> Self {
        Self {
            reference: reference.values(),
            strategy,
            deciles: DecileTable::from_reference(reference),
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Index of the last reference value `<= p`, or 0 when every value exceeds `p`.
    #[inline]
    pub fn match_probability(&self, p: f64) -> usize {
        match self.strategy {
            MatchStrategy::Binary => self.binary(p),
            MatchStrategy::DecileScan => self.decile_scan(p),
        }
    }

    #[inline]
    fn binary(&self, p: f64) -> usize {
        self.reference
            .partition_point(|&v| v <= p)
            .saturating_sub(1)
    }

    fn decile_scan(&self, p: f64) -> usize {
        let reference = self.reference;
        let mut start = self.deciles.start_for(p).min(reference.len() - 1);
        // The table entry can sit past the answer when p lies below its decile bound
        while start > 0 && reference[start] > p {
            start -= 1;
        }
        for (i, &v) in reference.iter().enumerate().skip(start) {
            if v > p {
                return i.saturating_sub(1);
            }
        }
        reference.len() - 1
    }
}

/// Write the matched bin of every valid input cell into `output`.
///
/// `output` must have the dimensions of `input`; cells that are no-data in the
/// input are left untouched (they already hold the output sentinel).
pub fn match_raster(
    input: &Raster,
    histogram: &Histogram,
    cdf: &EmpiricalCdf,
    matcher: &QuantileMatcher<'_>,
    output: &mut Raster,
    parallel_threshold: usize,
    host: &dyn ToolHost,
) -> Result<(), StretchError> {
    if input.rows() != output.rows() || input.columns() != output.columns() {
        return Err(StretchError::config(format!(
            "Output raster is {}x{}, expected {}x{}",
            output.rows(),
            output.columns(),
            input.rows(),
            input.columns()
        )));
    }

    let columns = input.columns();
    let progress = PassProgress::start(host, MATCHING_LABEL, input.rows());

    try_for_each_row_mut(output.data_mut(), columns, parallel_threshold, |row, out| {
        progress.check_cancelled()?;
        for (cell, &value) in out.iter_mut().zip(input.row(row)) {
            if input.is_nodata(value) {
                continue;
            }
            let p = cdf.probability(histogram.bin_index(value));
            *cell = matcher.match_probability(p) as f64;
        }
        progress.row_done();
        Ok(())
    })
}
