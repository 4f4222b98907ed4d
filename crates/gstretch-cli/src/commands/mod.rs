//! Command implementations for the gstretch CLI.

mod batch;
mod info;
mod init;
mod run;
mod stretch;

// Re-export all command functions
pub use batch::cmd_batch;
pub use info::cmd_info;
pub use init::cmd_init;
pub use run::cmd_run;
pub use stretch::cmd_stretch;

/// Failure of a subcommand.
#[derive(Debug, PartialEq)]
pub enum CommandError {
    /// Already shown to the user through the console host's feedback
    Reported,
    /// Still to be printed by `main`
    Message(String),
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

/// Failure of a tool run. Unless `silent`, the console host has printed the
/// user-facing message and the details went to the log.
fn tool_failure(message: String, silent: bool) -> CommandError {
    if silent {
        CommandError::Message(message)
    } else {
        log::debug!("Tool run failed: {}", message);
        CommandError::Reported
    }
}

/// Configure the global rayon pool when a thread count was requested.
fn configure_threads(threads: Option<usize>, silent: bool) -> Result<(), String> {
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        if !silent {
            println!("Using {} threads for parallel processing", num_threads);
        }
    }
    Ok(())
}
