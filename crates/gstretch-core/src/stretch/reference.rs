//! Reference (target) distribution: a truncated, discretized Gaussian CDF

use std::f64::consts::PI;

use crate::error::{try_filled_vec, StretchError};

/// Upper bounds used by the decile table, entries 1 through 9.
const DECILE_THRESHOLDS: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Cumulative distribution over the output bins, ending at exactly 1.0.
#[derive(Debug, Clone)]
pub struct ReferenceCdf {
    values: Vec<f64>,
}

impl ReferenceCdf {
    /// Standard normal density sampled at `num_output_bins` equally spaced
    /// points over `[-cutoff_sd, +cutoff_sd]`, accumulated and normalized.
    ///
    /// The missing tail mass is not compensated for; normalizing by the final
    /// cumulative value is what truncates the distribution.
    pub fn gaussian(num_output_bins: usize, cutoff_sd: f64) -> Result<Self, StretchError> {
        if num_output_bins < 2 {
            return Err(StretchError::config(format!(
                "Number of output bins must be at least 2, got {}",
                num_output_bins
            )));
        }
        if !cutoff_sd.is_finite() || cutoff_sd <= 0.0 {
            return Err(StretchError::config(format!(
                "Cutoff must be a positive number of standard deviations, got {}",
                cutoff_sd
            )));
        }

        let mut values = try_filled_vec(num_output_bins, 0.0, "reference CDF")?;
        let root_of_2pi = (2.0 * PI).sqrt();
        let last = (num_output_bins - 1) as f64;
        for (i, value) in values.iter_mut().enumerate() {
            let x = i as f64 / last * 2.0 * cutoff_sd - cutoff_sd;
            *value = (-x * x / 2.0).exp() / root_of_2pi;
        }

        for i in 1..num_output_bins {
            values[i] += values[i - 1];
        }
        let total = values[num_output_bins - 1];
        for value in values.iter_mut() {
            *value /= total;
        }

        Ok(Self { values })
    }

    /// Wrap an already computed CDF.
    ///
    /// Values must be non-decreasing; the last one is the upper bound of the
    /// probabilities that will be matched against it.
    pub fn from_values(values: Vec<f64>) -> Result<Self, StretchError> {
        if values.is_empty() {
            return Err(StretchError::config("Reference CDF must not be empty"));
        }
        if values.iter().any(|v| v.is_nan()) || values.windows(2).any(|w| w[0] > w[1]) {
            return Err(StretchError::config(
                "Reference CDF must be non-decreasing",
            ));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Search starting points, one per tenth of probability.
///
/// Entry `d` (1..=9) is the last index whose cumulative value is below `d/10`
/// (0 when there is none); entry 10 is the last index at or below 1.0.
/// Entry 0 is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecileTable([usize; 11]);

impl DecileTable {
    pub fn from_reference(reference: &ReferenceCdf) -> Self {
        let values = reference.values();
        let mut starts = [0usize; 11];
        for (d, &threshold) in DECILE_THRESHOLDS.iter().enumerate() {
            starts[d + 1] = values.partition_point(|&v| v < threshold).saturating_sub(1);
        }
        starts[10] = values.partition_point(|&v| v <= 1.0).saturating_sub(1);
        Self(starts)
    }

    pub fn entries(&self) -> &[usize; 11] {
        &self.0
    }

    /// Starting index for a scan looking for probability `p`.
    #[inline]
    pub fn start_for(&self, p: f64) -> usize {
        let decile = (p * 10.0).floor();
        if !(decile > 0.0) {
            self.0[0]
        } else {
            self.0[(decile as usize).min(10)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_is_monotone_and_normalized() {
        for (bins, cutoff) in [(2, 3.0), (9, 3.0), (255, 3.0), (1024, 2.5), (4096, 0.5)] {
            let reference = ReferenceCdf::gaussian(bins, cutoff).unwrap();
            let values = reference.values();

            assert_eq!(values.len(), bins);
            assert!(values[0] >= 0.0);
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(values[bins - 1], 1.0, "bins={} cutoff={}", bins, cutoff);
        }
    }

    #[test]
    fn test_gaussian_is_symmetric() {
        let reference = ReferenceCdf::gaussian(101, 3.0).unwrap();
        let values = reference.values();
        // Middle sample sits at x = 0, so half of the mass (plus half a bin) lies at or before it
        let mid = values[50];
        assert!((mid - 0.5).abs() < 0.02, "mid = {}", mid);
        // Mass below bin i mirrors the mass above bin 100 - i
        for i in 0..50 {
            let below = values[i];
            let above = 1.0 - values[99 - i];
            assert!((below - above).abs() < 1e-9, "i={} {} vs {}", i, below, above);
        }
    }

    #[test]
    fn test_gaussian_rejects_bad_parameters() {
        assert!(matches!(
            ReferenceCdf::gaussian(1, 3.0),
            Err(StretchError::Config(_))
        ));
        assert!(matches!(
            ReferenceCdf::gaussian(16, 0.0),
            Err(StretchError::Config(_))
        ));
        assert!(matches!(
            ReferenceCdf::gaussian(16, f64::NAN),
            Err(StretchError::Config(_))
        ));
    }

    #[test]
    fn test_from_values_requires_monotone() {
        assert!(ReferenceCdf::from_values(vec![0.1, 0.3, 0.5, 1.0]).is_ok());
        assert!(ReferenceCdf::from_values(vec![0.3, 0.1, 1.0]).is_err());
        assert!(ReferenceCdf::from_values(vec![]).is_err());
    }

    #[test]
    fn test_decile_table_matches_linear_scan() {
        let reference = ReferenceCdf::gaussian(1024, 3.0).unwrap();
        let values = reference.values();
        let table = DecileTable::from_reference(&reference);

        for d in 1..=9 {
            let threshold = d as f64 / 10.0;
            let mut expected = 0;
            for (i, &v) in values.iter().enumerate() {
                if v < threshold {
                    expected = i;
                }
            }
            assert_eq!(table.entries()[d], expected, "decile {}", d);
        }
        assert_eq!(table.entries()[10], 1023);
        assert_eq!(table.entries()[0], 0);
    }

    #[test]
    fn test_decile_table_small_reference() {
        let reference = ReferenceCdf::from_values(vec![0.1, 0.3, 0.5, 0.7, 0.9, 1.0]).unwrap();
        let table = DecileTable::from_reference(&reference);

        // 0.1 < 0.1 never holds, so decile 1 stays at 0
        assert_eq!(table.entries(), &[0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 5]);
        // floor(0.55 * 10) = 5: last index below 0.5
        assert_eq!(table.start_for(0.55), 1);
        assert_eq!(table.start_for(0.65), 2);
        assert_eq!(table.start_for(1.0), 5);
        assert_eq!(table.start_for(0.0), 0);
    }
}
