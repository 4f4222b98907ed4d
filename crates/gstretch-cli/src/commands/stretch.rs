use std::path::PathBuf;

use gstretch_cli::{determine_output_path, process_single_image, StretchSettings};
use gstretch_core::config::{log_config_usage, stretch_config_handle};
use gstretch_core::{CancelFlag, ConsoleHost, ToolOutcome};

use super::{configure_threads, tool_failure, CommandError};

/// Stretch a single raster.
#[allow(clippy::too_many_arguments)]
pub fn cmd_stretch(
    input: PathBuf,
    out: Option<PathBuf>,
    cutoff: Option<f64>,
    bins: Option<usize>,
    config: Option<PathBuf>,
    threads: Option<usize>,
    silent: bool,
    cancel: CancelFlag,
) -> Result<(), CommandError> {
    let handle = stretch_config_handle(config.as_deref());
    log_config_usage();
    configure_threads(threads, silent)?;

    if !input.is_file() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    let output = determine_output_path(&input, &out)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create output directory: {}", e))?;
        }
    }
    let settings = StretchSettings {
        cutoff_sd: cutoff,
        num_output_bins: bins,
    };

    if !silent {
        println!("Stretching {} -> {}", input.display(), output.display());
    }

    let host = ConsoleHost::new(cancel, silent);
    match process_single_image(&input, &output, &settings, &handle.config.defaults, &host)
        .map_err(|e| tool_failure(e, silent))?
    {
        ToolOutcome::Completed(path) => {
            if !silent {
                println!("Output written to {}", path.display());
            }
        }
        ToolOutcome::Cancelled => {
            log::info!("Stretch of {} cancelled", input.display());
        }
    }
    Ok(())
}
