use clap::{Parser, Subcommand};
use gstretch_core::CancelFlag;
use std::path::PathBuf;

mod commands;

use commands::{cmd_batch, cmd_info, cmd_init, cmd_run, cmd_stretch, CommandError};

#[derive(Parser)]
#[command(name = "gstretch")]
#[command(
    version,
    about = "Gaussian contrast stretch for single-band rasters",
    long_about = None
)]
struct Cli {
    /// Configuration file (overrides the search path)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug details (parameters, pass timings)
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress progress and status output
    #[arg(long, global = true)]
    silent: bool,

    /// Directory for log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stretch a raster so its values follow a truncated normal distribution
    Stretch {
        /// Input raster (.tif, .tiff or grayscale .png)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file or directory
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Half-width of the reference distribution in standard deviations
        #[arg(long, value_name = "SD")]
        cutoff: Option<f64>,

        /// Number of output bins (output values are 0..N-1)
        #[arg(long, value_name = "N")]
        bins: Option<usize>,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Stretch multiple rasters with shared settings
    Batch {
        /// Input files or directories
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (defaults to next to each input)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Half-width of the reference distribution in standard deviations
        #[arg(long, value_name = "SD")]
        cutoff: Option<f64>,

        /// Number of output bins (output values are 0..N-1)
        #[arg(long, value_name = "N")]
        bins: Option<usize>,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Run with tool-style arguments: INPUT OUTPUT [CUTOFF] [BINS], or
    /// --input=.. --output=.. --cutoff=.. --bins=..
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Show dimensions, no-data value and value range of a raster
    Info {
        /// Input raster
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file
    Init {
        /// Target file (default: ~/gstretch/gstretch.yml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let _logger = match gstretch_cli::setup_logging(cli.verbose, cli.log_dir.as_deref()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    // Ctrl-C asks the running stretch to stop at the next row
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            log::warn!("Could not install Ctrl-C handler: {}", e);
        }
    }

    let result = match cli.command {
        Commands::Stretch {
            input,
            out,
            cutoff,
            bins,
            threads,
        } => cmd_stretch(
            input, out, cutoff, bins, cli.config, threads, cli.silent, cancel,
        ),
        Commands::Batch {
            inputs,
            out,
            recursive,
            cutoff,
            bins,
            threads,
        } => cmd_batch(
            inputs, recursive, out, cutoff, bins, cli.config, threads, cli.silent, cancel,
        )
        .map_err(CommandError::from),
        Commands::Run { args } => cmd_run(args, cli.config, cli.silent, cancel),
        Commands::Info { input, json } => {
            cmd_info(input, json, cli.config).map_err(CommandError::from)
        }
        Commands::Init { path, force } => cmd_init(path, force).map_err(CommandError::from),
    };

    if let Err(e) = result {
        if let CommandError::Message(message) = e {
            eprintln!("Error: {}", message);
        }
        std::process::exit(1);
    }
}
