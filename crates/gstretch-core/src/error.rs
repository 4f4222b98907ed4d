//! Error type shared by every stage of the stretch.

use std::collections::TryReserveError;

/// Everything that can stop a stretch before it produces an output raster.
#[derive(thiserror::Error, Debug)]
pub enum StretchError {
    /// Missing or malformed parameters. Raised before any raster I/O.
    #[error("{0}")]
    Config(String),

    /// A working buffer could not be allocated.
    #[error("out of memory while allocating {what}")]
    OutOfMemory { what: &'static str },

    /// The input raster could not be read.
    #[error("failed to read raster: {0}")]
    Decode(String),

    /// The output raster could not be written.
    #[error("failed to write raster: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The host asked the operation to stop.
    #[error("operation cancelled")]
    Cancelled,
}

impl StretchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Text shown to the user through `ToolHost::show_feedback`.
    ///
    /// Configuration problems are reported verbatim. I/O failures get a generic
    /// message; their details go to the host's error log instead.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(message) => message.clone(),
            Self::OutOfMemory { .. } => {
                "An out-of-memory error has occurred during operation.".to_string()
            }
            Self::Cancelled => "Operation cancelled.".to_string(),
            Self::Decode(_) | Self::Export(_) | Self::Io(_) => {
                "An error has occurred during operation. See log file for details.".to_string()
            }
        }
    }

    /// Whether the details of this error belong in the diagnostic log.
    pub fn needs_logging(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Export(_) | Self::Io(_))
    }
}

/// Allocate a vector of `len` copies of `value`, reporting allocation failure
/// as [`StretchError::OutOfMemory`] instead of aborting.
pub fn try_filled_vec<T: Clone>(
    len: usize,
    value: T,
    what: &'static str,
) -> Result<Vec<T>, StretchError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_: TryReserveError| StretchError::OutOfMemory { what })?;
    buffer.resize(len, value);
    Ok(buffer)
}
