//! Host collaborator: progress, feedback, cancellation and completion.
//!
//! The stretch never talks to a global host. Callers pass something that
//! implements [`ToolHost`] and the algorithm reports through it.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::StretchError;

/// Capabilities the stretch needs from whoever runs it.
///
/// Every method has a no-op default. Implementations must be shareable
/// across the worker threads of a pass.
pub trait ToolHost: Send + Sync {
    /// Progress for the current phase, `percent` in 0..=100.
    fn update_progress(&self, _label: &str, _percent: u8) {}

    /// A message meant for the user.
    fn show_feedback(&self, _message: &str) {}

    /// Polled once per row.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Diagnostic details for a failure the user only sees a summary of.
    fn log_error(&self, context: &str, error: &StretchError) {
        log::error!("{}: {}", context, error);
    }

    /// The finished output, for display or downstream use.
    fn return_data(&self, _output: &Path) {}

    /// The tool is done and available for reuse. Called exactly once per run.
    fn complete(&self) {}
}

/// Host that ignores progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unattended;

impl ToolHost for Unattended {}

/// Cloneable cancellation flag, e.g. set from a Ctrl-C handler.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Suppresses repeated progress notifications.
///
/// Remembers the last label and percentage and only lets a change through.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Mutex<Option<(String, u8)>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `(label, percent)` differs from the previous update.
    pub fn should_emit(&self, label: &str, percent: u8) -> bool {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let changed = match last.as_ref() {
            Some((prev_label, prev_percent)) => prev_label != label || *prev_percent != percent,
            None => true,
        };
        if changed {
            *last = Some((label.to_string(), percent));
        }
        changed
    }
}

/// Host for terminal use: progress and feedback go to stdout.
pub struct ConsoleHost {
    tracker: ProgressTracker,
    cancel: CancelFlag,
    silent: bool,
    completed: AtomicUsize,
}

impl ConsoleHost {
    pub fn new(cancel: CancelFlag, silent: bool) -> Self {
        Self {
            tracker: ProgressTracker::new(),
            cancel,
            silent,
            completed: AtomicUsize::new(0),
        }
    }

    /// Number of times [`ToolHost::complete`] was called.
    pub fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ToolHost for ConsoleHost {
    fn update_progress(&self, label: &str, percent: u8) {
        if !self.tracker.should_emit(label, percent) || self.silent || percent == 0 {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let end = if percent >= 100 { "\n" } else { "" };
        let _ = write!(stdout, "\r{}{}%{}", label, percent, end);
        let _ = stdout.flush();
    }

    fn show_feedback(&self, message: &str) {
        if !self.silent {
            println!("{}", message);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn return_data(&self, output: &Path) {
        log::info!("Output written to {}", output.display());
    }

    fn complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Row counter for one pass, turning completed rows into progress updates.
///
/// Safe to share between the workers of a pass.
pub struct PassProgress<'a> {
    host: &'a dyn ToolHost,
    label: &'static str,
    rows: usize,
    done: AtomicUsize,
    reported: AtomicU8,
    emit: Mutex<()>,
}

impl<'a> PassProgress<'a> {
    pub fn start(host: &'a dyn ToolHost, label: &'static str, rows: usize) -> Self {
        host.update_progress(label, 0);
        Self {
            host,
            label,
            rows: rows.max(1),
            done: AtomicUsize::new(0),
            reported: AtomicU8::new(0),
            emit: Mutex::new(()),
        }
    }

    /// Poll for cancellation at a row boundary.
    pub fn check_cancelled(&self) -> Result<(), StretchError> {
        if self.host.is_cancelled() {
            Err(StretchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record one finished row.
    ///
    /// Only percentages above the last reported one reach the host, so
    /// updates never go backwards when rows finish on several workers.
    pub fn row_done(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let percent = (100 * done / self.rows).min(100) as u8;
        if percent <= self.reported.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.emit.lock().unwrap_or_else(|e| e.into_inner());
        if self.reported.fetch_max(percent, Ordering::AcqRel) < percent {
            self.host.update_progress(self.label, percent);
        }
    }
}
