use std::path::PathBuf;

use gstretch_core::config::{log_config_usage, stretch_config_handle};
use gstretch_core::{CancelFlag, ConsoleHost, GaussianStretch, ToolOutcome};

use super::{tool_failure, CommandError};

/// Run the tool with host-style string arguments, e.g.
/// `gstretch run -- band3.tif band3_out.tif 3 255` or
/// `gstretch run -- --input=band3.tif --output=out.tif --bins=255`.
pub fn cmd_run(
    args: Vec<String>,
    config: Option<PathBuf>,
    silent: bool,
    cancel: CancelFlag,
) -> Result<(), CommandError> {
    let handle = stretch_config_handle(config.as_deref());
    log_config_usage();

    let working_directory = std::env::current_dir()
        .map_err(|e| format!("Could not determine working directory: {}", e))?;
    let host = ConsoleHost::new(cancel, silent);
    let tool = GaussianStretch::new(&handle.config.defaults);

    match tool
        .run_with_args(&args, Some(&working_directory), &host)
        .map_err(|e| tool_failure(e.to_string(), silent))?
    {
        ToolOutcome::Completed(path) => {
            if !silent {
                println!("Output written to {}", path.display());
            }
        }
        ToolOutcome::Cancelled => log::info!("Run cancelled"),
    }
    Ok(())
}
