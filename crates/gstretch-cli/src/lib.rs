//! Shared utilities for gstretch-cli
//!
//! Output path handling, input expansion, single-file processing and
//! logging setup used by the `gstretch` subcommands.

pub mod logging;
pub mod processing;

// Re-export commonly used items at the crate root for convenience
pub use logging::setup_logging;
pub use processing::{
    determine_output_path, expand_inputs, process_single_image, StretchSettings,
    SUPPORTED_EXTENSIONS,
};
