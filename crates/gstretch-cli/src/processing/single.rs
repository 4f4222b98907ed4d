//! Single-raster processing shared by the `stretch` and `batch` commands.

use std::path::Path;

use gstretch_core::config::StretchDefaults;
use gstretch_core::{GaussianStretch, StretchArgs, ToolHost, ToolOutcome};

/// Stretch options given on the command line; unset values come from the
/// configuration defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StretchSettings {
    pub cutoff_sd: Option<f64>,
    pub num_output_bins: Option<usize>,
}

impl StretchSettings {
    /// Tool arguments for one input/output pair.
    pub fn to_args(&self, input: &Path, output: &Path, defaults: &StretchDefaults) -> StretchArgs {
        let mut args = StretchArgs::new(input, output, defaults);
        if let Some(cutoff_sd) = self.cutoff_sd {
            args.cutoff_sd = cutoff_sd;
        }
        if let Some(num_output_bins) = self.num_output_bins {
            args.num_output_bins = num_output_bins;
        }
        args
    }
}

/// Stretch one raster file into another.
///
/// Creates the output directory when needed. Cancellation is reported as
/// `Ok(ToolOutcome::Cancelled)`.
pub fn process_single_image(
    input: &Path,
    output: &Path,
    settings: &StretchSettings,
    defaults: &StretchDefaults,
    host: &dyn ToolHost,
) -> Result<ToolOutcome, String> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create output directory: {}", e))?;
        }
    }

    let args = settings.to_args(input, output, defaults);
    GaussianStretch::new(defaults)
        .run(&args, host)
        .map_err(|e| format!("{}: {}", input.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstretch_core::exporters::export_raster;
    use gstretch_core::{Raster, RasterDataType, Unattended};
    use tempfile::tempdir;

    #[test]
    fn test_settings_override_defaults() {
        let defaults = StretchDefaults::default();
        let settings = StretchSettings {
            cutoff_sd: Some(2.0),
            num_output_bins: None,
        };

        let args = settings.to_args(Path::new("a.tif"), Path::new("b.tif"), &defaults);
        assert_eq!(args.cutoff_sd, 2.0);
        assert_eq!(args.num_output_bins, defaults.num_output_bins);
    }

    #[test]
    fn test_process_single_image_creates_output_dir() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dem.tif");
        let data = (0..64).map(|i| (i * i) as f64).collect();
        let raster = Raster::from_data(8, 8, -9999.0, data, RasterDataType::F32).unwrap();
        export_raster(&raster, &input, None).unwrap();

        let output = dir.path().join("out").join("dem_gaussian.tif");
        let outcome = process_single_image(
            &input,
            &output,
            &StretchSettings::default(),
            &StretchDefaults::default(),
            &Unattended,
        )
        .unwrap();

        assert_eq!(outcome, ToolOutcome::Completed(output.clone()));
        assert!(output.exists());
    }

    #[test]
    fn test_process_single_image_reports_bad_input() {
        let dir = tempdir().unwrap();
        let result = process_single_image(
            &dir.path().join("missing.tif"),
            &dir.path().join("out.tif"),
            &StretchSettings::default(),
            &StretchDefaults::default(),
            &Unattended,
        );
        assert!(result.unwrap_err().contains("missing.tif"));
    }
}
