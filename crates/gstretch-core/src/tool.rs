//! The Gaussian Contrast Stretch tool: read, stretch, annotate, write.

use std::path::{Path, PathBuf};

use crate::config::StretchDefaults;
use crate::decoders::decode_raster;
use crate::error::StretchError;
use crate::exporters::export_raster;
use crate::host::ToolHost;
use crate::params::StretchArgs;
use crate::stretch::{gaussian_stretch, StretchOutput};

pub const TOOL_NAME: &str = "GaussianStretch";
pub const TOOL_DESCRIPTIVE_NAME: &str = "Gaussian Contrast Stretch";
pub const TOOL_DESCRIPTION: &str = "Performs a Gaussian contrast stretch on an input image.";
pub const TOOLBOX: &str = "ImageEnhancement";

const RESET_LABEL: &str = "Progress: ";

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The output raster was written to this path
    Completed(PathBuf),
    /// The host cancelled; nothing was written
    Cancelled,
}

/// Runs the stretch from file to file and reports through a [`ToolHost`].
#[derive(Debug, Clone, Default)]
pub struct GaussianStretch {
    defaults: StretchDefaults,
}

impl GaussianStretch {
    pub fn new(defaults: &StretchDefaults) -> Self {
        Self {
            defaults: defaults.clone(),
        }
    }

    pub fn defaults(&self) -> &StretchDefaults {
        &self.defaults
    }

    /// Run with already parsed arguments.
    ///
    /// Every outcome is reported to `host`: feedback for cancellation and
    /// failures, the output path on success. Progress is reset and
    /// [`ToolHost::complete`] called exactly once, whatever happens.
    pub fn run(&self, args: &StretchArgs, host: &dyn ToolHost) -> Result<ToolOutcome, StretchError> {
        let result = self.execute(args, host);
        finish(result, host)
    }

    /// Run with host-style string arguments (see [`StretchArgs::from_args`]).
    pub fn run_with_args(
        &self,
        args: &[String],
        working_directory: Option<&Path>,
        host: &dyn ToolHost,
    ) -> Result<ToolOutcome, StretchError> {
        let result = StretchArgs::from_args(args, &self.defaults, working_directory)
            .and_then(|args| self.execute(&args, host));
        finish(result, host)
    }

    fn execute(&self, args: &StretchArgs, host: &dyn ToolHost) -> Result<PathBuf, StretchError> {
        args.validate()?;
        let params = args.to_params(&self.defaults);
        params.validate()?;

        let input = decode_raster(&args.input, self.defaults.default_nodata)?;
        let StretchOutput {
            raster: mut output,
            elapsed,
            ..
        } = gaussian_stretch(&input, &params, host)?;
        drop(input);

        output.add_metadata_entry(format!("Created by the {} tool.", TOOL_DESCRIPTIVE_NAME));
        output.add_metadata_entry(format!(
            "Created on {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        output.add_metadata_entry(format!("Input file: {}", args.input.display()));
        output.add_metadata_entry(format!("Cutoff: {} SD", params.cutoff_sd));
        output.add_metadata_entry(format!("Number of output bins: {}", params.num_output_bins));
        output.add_metadata_entry(format!(
            "Elapsed time (excluding I/O): {:.3}s",
            elapsed.as_secs_f64()
        ));

        export_raster(&output, &args.output, Some(TOOL_NAME))?;
        log::info!(
            "{}: {} -> {} in {:.3}s",
            TOOL_NAME,
            args.input.display(),
            args.output.display(),
            elapsed.as_secs_f64()
        );
        Ok(args.output.clone())
    }
}

fn finish(
    result: Result<PathBuf, StretchError>,
    host: &dyn ToolHost,
) -> Result<ToolOutcome, StretchError> {
    let outcome = match result {
        Ok(path) => {
            host.return_data(&path);
            Ok(ToolOutcome::Completed(path))
        }
        Err(StretchError::Cancelled) => {
            host.show_feedback(&StretchError::Cancelled.user_message());
            Ok(ToolOutcome::Cancelled)
        }
        Err(e) => {
            if e.needs_logging() {
                host.log_error(TOOL_NAME, &e);
            }
            host.show_feedback(&e.user_message());
            Err(e)
        }
    };
    host.update_progress(RESET_LABEL, 0);
    host.complete();
    outcome
}
