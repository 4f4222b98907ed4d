//! Tests for the full stretch

use std::sync::Mutex;

use super::*;
use crate::host::Unattended;

fn raster(rows: usize, columns: usize, nodata: f64, data: Vec<f64>) -> Raster {
    Raster::from_data(rows, columns, nodata, data, RasterDataType::F64).unwrap()
}

fn params(cutoff_sd: f64, num_output_bins: usize) -> StretchParams {
    StretchParams {
        cutoff_sd,
        num_output_bins,
        ..StretchParams::default()
    }
}

/// Deterministic skewed test surface with a few holes.
fn skewed_raster(rows: usize, columns: usize) -> Raster {
    let data = (0..rows * columns)
        .map(|i| {
            if i % 13 == 5 {
                -9999.0
            } else {
                let t = ((i * 7919) % 10007) as f64 / 10007.0;
                t * t * t * 1200.0 - 40.0
            }
        })
        .collect();
    raster(rows, columns, -9999.0, data)
}

#[derive(Default)]
struct RecordingHost {
    labels: Mutex<Vec<String>>,
}

impl ToolHost for RecordingHost {
    fn update_progress(&self, label: &str, _percent: u8) {
        let mut labels = self.labels.lock().unwrap();
        if labels.last().map(String::as_str) != Some(label) {
            labels.push(label.to_string());
        }
    }
}

// ========================================================================
// Parameters
// ========================================================================

#[test]
fn test_params_from_defaults() {
    let params = StretchParams::default();
    assert_eq!(params.cutoff_sd, 3.0);
    assert_eq!(params.num_output_bins, 1024);
    assert_eq!(params.histogram_bins, 50_000);
    assert_eq!(params.match_strategy, MatchStrategy::Binary);
    assert!(params.validate().is_ok());
}

#[test]
fn test_params_validation() {
    assert!(params(0.0, 1024).validate().is_err());
    assert!(params(-1.0, 1024).validate().is_err());
    assert!(params(f64::INFINITY, 1024).validate().is_err());
    assert!(params(3.0, 1).validate().is_err());
    assert!(params(3.0, 2).validate().is_ok());

    let colliding = StretchParams {
        fallback_nodata: 10.0,
        ..StretchParams::default()
    };
    assert!(colliding.validate().is_err());

    for fallback_nodata in [-1e10, 3e9, -0.5, f64::NAN] {
        let unrepresentable = StretchParams {
            fallback_nodata,
            ..StretchParams::default()
        };
        assert!(
            matches!(unrepresentable.validate(), Err(StretchError::Config(_))),
            "{}",
            fallback_nodata
        );
    }
}

#[test]
fn test_output_nodata() {
    assert_eq!(output_nodata(-9999.0, 1024, -32768.0), -9999.0);
    assert_eq!(output_nodata(-3.4e38, 1024, -32768.0), -32768.0);
    assert_eq!(output_nodata(f64::NAN, 1024, -32768.0), -32768.0);
    assert_eq!(output_nodata(-1.5, 1024, -32768.0), -32768.0);
    // Would be indistinguishable from a valid bin index
    assert_eq!(output_nodata(0.0, 1024, -32768.0), -32768.0);
    assert_eq!(output_nodata(1024.0, 1024, -32768.0), 1024.0);
}

// ========================================================================
// Stretch behavior
// ========================================================================

#[test]
fn test_four_cell_scenario() {
    let input = raster(1, 4, -9999.0, vec![1.0, 5.0, -9999.0, 9.0]);

    let output = gaussian_stretch(&input, &params(3.0, 9), &Unattended).unwrap();
    let cells = output.raster.data();

    assert_eq!(output.valid_cells, 3);
    assert_eq!(output.value_range, Some((1.0, 9.0)));
    assert_eq!(output.raster.nodata(), -9999.0);
    assert_eq!(output.raster.data_type, RasterDataType::I32);
    assert_eq!(cells[2], -9999.0);
    assert!(cells[0] <= cells[1] && cells[1] <= cells[3]);
    // Probabilities 1/3, 2/3 and 1 against a 9-bin reference over +-3 SD
    assert_eq!(cells, &[2.0, 4.0, -9999.0, 8.0]);
}

#[test]
fn test_outputs_are_bin_indices() {
    let input = skewed_raster(40, 50);
    let output = gaussian_stretch(&input, &params(2.5, 256), &Unattended).unwrap();

    for (&value, &out) in input.data().iter().zip(output.raster.data()) {
        if input.is_nodata(value) {
            assert_eq!(out, output.raster.nodata());
        } else {
            assert_eq!(out.fract(), 0.0);
            assert!((0.0..256.0).contains(&out), "out of range: {}", out);
        }
    }
}

#[test]
fn test_nodata_passes_through() {
    let input = skewed_raster(20, 20);
    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    let input_holes: Vec<usize> = (0..input.len())
        .filter(|&i| input.is_nodata(input.data()[i]))
        .collect();
    let output_holes: Vec<usize> = (0..output.raster.len())
        .filter(|&i| output.raster.is_nodata(output.raster.data()[i]))
        .collect();

    assert_eq!(input_holes, output_holes);
    assert_eq!(output.valid_cells as usize, input.valid_cell_count());
}

#[test]
fn test_stretch_is_monotone() {
    let input = skewed_raster(30, 30);
    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    let mut pairs: Vec<(f64, f64)> = input
        .data()
        .iter()
        .zip(output.raster.data())
        .filter(|(v, _)| !input.is_nodata(**v))
        .map(|(&v, &o)| (v, o))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    for w in pairs.windows(2) {
        assert!(
            w[0].1 <= w[1].1,
            "value {} -> {} but value {} -> {}",
            w[0].0,
            w[0].1,
            w[1].0,
            w[1].1
        );
    }
}

#[test]
fn test_stretch_is_idempotent() {
    let input = skewed_raster(25, 17);
    let first = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();
    let second = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    let first_bits: Vec<u64> = first.raster.data().iter().map(|v| v.to_bits()).collect();
    let second_bits: Vec<u64> = second.raster.data().iter().map(|v| v.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn test_output_roughly_follows_gaussian() {
    let input = skewed_raster(100, 100);
    let output = gaussian_stretch(&input, &params(3.0, 1024), &Unattended).unwrap();

    let valid: Vec<f64> = output
        .raster
        .data()
        .iter()
        .copied()
        .filter(|&v| !output.raster.is_nodata(v))
        .collect();
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    // Cubic input is heavily skewed; the stretched output centres on the middle bin
    assert!((mean - 511.5).abs() < 20.0, "mean = {}", mean);
}

#[test]
fn test_constant_raster_maps_to_single_index() {
    let input = raster(4, 4, -9999.0, vec![7.25; 16]);
    let output = gaussian_stretch(&input, &params(3.0, 64), &Unattended).unwrap();

    assert_eq!(output.valid_cells, 16);
    assert!(output.raster.data().iter().all(|&v| v == 63.0));
}

#[test]
fn test_all_nodata_raster() {
    let input = raster(3, 3, -9999.0, vec![-9999.0; 9]);
    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    assert_eq!(output.valid_cells, 0);
    assert!(output.value_range.is_none());
    assert!(output.raster.data().iter().all(|&v| v == -9999.0));
}

#[test]
fn test_nan_nodata_falls_back_to_integer_sentinel() {
    let mut input = raster(1, 4, f64::NAN, vec![0.5, f64::NAN, 1.5, 2.5]);
    input.data_type = RasterDataType::F32;

    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    assert_eq!(output.raster.nodata(), -32768.0);
    assert_eq!(output.raster.data()[1], -32768.0);
    assert_eq!(output.valid_cells, 3);
}

#[test]
fn test_infinite_cells_pass_through_as_nodata() {
    let input = raster(1, 3, -9999.0, vec![1.0, 2.0, f64::INFINITY]);

    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();

    assert_eq!(output.valid_cells, 2);
    assert_eq!(output.value_range, Some((1.0, 2.0)));
    assert_eq!(output.raster.data()[2], -9999.0);
    assert!((0.0..1024.0).contains(&output.raster.data()[0]));
}

#[test]
fn test_strategies_produce_identical_rasters() {
    let input = skewed_raster(64, 48);
    let binary = StretchParams {
        match_strategy: MatchStrategy::Binary,
        ..StretchParams::default()
    };
    let scan = StretchParams {
        match_strategy: MatchStrategy::DecileScan,
        ..StretchParams::default()
    };

    let a = gaussian_stretch(&input, &binary, &Unattended).unwrap();
    let b = gaussian_stretch(&input, &scan, &Unattended).unwrap();
    assert_eq!(a.raster.data(), b.raster.data());
}

#[test]
fn test_parallel_matches_sequential() {
    let input = skewed_raster(200, 31);
    let sequential = StretchParams {
        parallel_row_threshold: usize::MAX,
        ..StretchParams::default()
    };
    let parallel = StretchParams {
        parallel_row_threshold: 1,
        ..StretchParams::default()
    };

    let a = gaussian_stretch(&input, &sequential, &Unattended).unwrap();
    let b = gaussian_stretch(&input, &parallel, &Unattended).unwrap();
    assert_eq!(a.raster.data(), b.raster.data());
}

#[test]
fn test_palette_is_carried_over() {
    let mut input = skewed_raster(4, 4);
    input.palette = Some("spectrum.plt".to_string());

    let output = gaussian_stretch(&input, &StretchParams::default(), &Unattended).unwrap();
    assert_eq!(output.raster.palette.as_deref(), Some("spectrum.plt"));
}

// ========================================================================
// Host interaction
// ========================================================================

#[test]
fn test_progress_phases_in_order() {
    let input = skewed_raster(10, 10);
    let host = RecordingHost::default();

    gaussian_stretch(&input, &StretchParams::default(), &host).unwrap();

    let labels = host.labels.lock().unwrap();
    assert_eq!(
        *labels,
        vec![
            "Loop 1 of 3: ".to_string(),
            "Loop 2 of 3: ".to_string(),
            "Loop 3 of 3: ".to_string()
        ]
    );
}

#[test]
fn test_cancellation_aborts_stretch() {
    struct CancelImmediately;
    impl ToolHost for CancelImmediately {
        fn is_cancelled(&self) -> bool {
            true
        }
    }

    let input = skewed_raster(10, 10);
    let result = gaussian_stretch(&input, &StretchParams::default(), &CancelImmediately);
    assert!(matches!(result, Err(StretchError::Cancelled)));
}

#[test]
fn test_invalid_params_rejected_before_work() {
    let input = skewed_raster(10, 10);
    let host = RecordingHost::default();

    let result = gaussian_stretch(&input, &params(3.0, 1), &host);

    assert!(matches!(result, Err(StretchError::Config(_))));
    assert!(host.labels.lock().unwrap().is_empty());
}
