//! Logging setup for the command-line tool.
//!
//! Everything goes to a rotating log file under `logs/`; warnings and errors
//! are duplicated to stderr. Failures the user only sees a summary of are
//! written here in full.

use std::path::Path;

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

/// Default directory for log files, relative to the working directory.
pub const LOG_DIRECTORY: &str = "logs";

/// Log specification for the requested verbosity.
pub fn log_spec(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Start file logging. Keep the returned handle alive until the program exits.
pub fn setup_logging(verbose: bool, directory: Option<&Path>) -> Result<LoggerHandle, String> {
    let directory = directory.unwrap_or(Path::new(LOG_DIRECTORY));
    Logger::try_with_env_or_str(log_spec(verbose))
        .map_err(|e| format!("Invalid log specification: {}", e))?
        .log_to_file(
            FileSpec::default()
                .directory(directory)
                .basename("gstretch"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(1024 * 1024), // 1MB
            Naming::Timestamps,
            Cleanup::KeepLogFiles(5),
        )
        .start()
        .map_err(|e| format!("Logger initialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_spec() {
        assert_eq!(log_spec(true), "debug");
        assert_eq!(log_spec(false), "info");
    }
}
