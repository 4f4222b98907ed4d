//! Gstretch Core Library
//!
//! Gaussian contrast stretch (histogram matching) for single-band rasters.

pub mod config;
pub mod decoders;
pub mod error;
pub mod exporters;
pub mod host;
pub mod params;
pub mod raster;
pub mod stretch;
pub mod tool;

// Re-export commonly used types
pub use error::StretchError;
pub use host::{CancelFlag, ConsoleHost, ToolHost, Unattended};
pub use params::StretchArgs;
pub use raster::{Raster, RasterDataType};
pub use stretch::{gaussian_stretch, MatchStrategy, StretchOutput, StretchParams};
pub use tool::{GaussianStretch, ToolOutcome};
