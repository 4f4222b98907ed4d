use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use gstretch_cli::{determine_output_path, expand_inputs, process_single_image, StretchSettings};
use gstretch_core::config::{log_config_usage, stretch_config_handle};
use gstretch_core::{CancelFlag, ConsoleHost, ToolOutcome};

use super::configure_threads;

/// Stretch many rasters with shared settings, files processed in parallel.
#[allow(clippy::too_many_arguments)]
pub fn cmd_batch(
    inputs: Vec<PathBuf>,
    recursive: bool,
    out: Option<PathBuf>,
    cutoff: Option<f64>,
    bins: Option<usize>,
    config: Option<PathBuf>,
    threads: Option<usize>,
    silent: bool,
    cancel: CancelFlag,
) -> Result<(), String> {
    let batch_start = Instant::now();
    let handle = stretch_config_handle(config.as_deref());
    log_config_usage();

    if inputs.is_empty() {
        return Err("No input files or directories specified".to_string());
    }

    // Expand directories to file lists
    let inputs = expand_inputs(&inputs, recursive)?;
    if inputs.is_empty() {
        return Err("No supported raster files found (supported: .tif, .tiff, .png)".to_string());
    }

    if !silent {
        println!("Found {} raster files to process", inputs.len());
    }

    configure_threads(threads, silent)?;

    if let Some(dir) = &out {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create output directory: {}", e))?;
        }
        if !dir.is_dir() {
            return Err(format!(
                "Batch output must be a directory: {}",
                dir.display()
            ));
        }
    }

    let settings = StretchSettings {
        cutoff_sd: cutoff,
        num_output_bins: bins,
    };
    let defaults = &handle.config.defaults;
    let total_files = inputs.len();
    let processed_count = AtomicUsize::new(0);

    let results: Vec<Result<ToolOutcome, String>> = inputs
        .par_iter()
        .map(|input| -> Result<ToolOutcome, String> {
            let output_path = determine_output_path(input, &out)?;
            // Per-file progress would interleave; only the summary lines are printed
            let host = ConsoleHost::new(cancel.clone(), true);
            let outcome = process_single_image(input, &output_path, &settings, defaults, &host)?;

            if let ToolOutcome::Completed(path) = &outcome {
                let count = processed_count.fetch_add(1, Ordering::SeqCst) + 1;
                if !silent {
                    println!(
                        "[{}/{}] Processed: {} -> {}",
                        count,
                        total_files,
                        input.display(),
                        path.display()
                    );
                }
            }
            Ok(outcome)
        })
        .collect();

    // Summarize results
    let mut success_count = 0;
    let mut cancelled_count = 0;
    let mut errors: Vec<(PathBuf, String)> = Vec::new();
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(ToolOutcome::Completed(_)) => success_count += 1,
            Ok(ToolOutcome::Cancelled) => cancelled_count += 1,
            Err(e) => errors.push((input.clone(), e)),
        }
    }

    log::info!(
        "Batch finished: {} succeeded, {} failed, {} cancelled in {:.2}s",
        success_count,
        errors.len(),
        cancelled_count,
        batch_start.elapsed().as_secs_f64()
    );

    if !silent {
        println!("\n========================================");
        println!("BATCH PROCESSING COMPLETE");
        println!("========================================");
        println!("  Successful: {}", success_count);
        println!("  Failed:     {}", errors.len());
        if cancelled_count > 0 {
            println!("  Cancelled:  {}", cancelled_count);
        }
        println!("  Time:       {:.2}s", batch_start.elapsed().as_secs_f64());

        if !errors.is_empty() {
            println!("\nErrors:");
            for (path, error) in &errors {
                println!("  {}: {}", path.display(), error);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} files failed to process", errors.len()))
    }
}
