/// Cancellation and progress reporting for long running fits
use indicatif::ProgressBar;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared handle passed into density evaluation and clustering.
///
/// Cloning shares the cancellation flag and the progress bar, so a host can
/// keep one clone to cancel a fit running on another.
#[derive(Clone)]
pub struct FitControl {
    cancelled: Arc<AtomicBool>,
    progress: ProgressBar,
}

impl FitControl {
    /// Control with a hidden progress bar.
    pub fn new() -> Self {
        Self::with_progress(ProgressBar::hidden())
    }

    /// Control that reports through the given bar.
    pub fn with_progress(progress: ProgressBar) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            progress,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Clears a previous cancellation so the control can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }

    /// Starts a unit of work of `len` steps.
    pub fn begin(&self, len: usize, message: &'static str) {
        self.progress.set_length(len as u64);
        self.progress.set_position(0);
        self.progress.set_message(message);
    }

    pub fn advance(&self, steps: usize) {
        self.progress.inc(steps as u64);
    }

    pub fn finish(&self, message: &'static str) {
        self.progress.finish_with_message(message);
    }

    pub fn progress(&self) -> &ProgressBar {
        &self.progress
    }
}

impl Default for FitControl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FitControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitControl")
            .field("cancelled", &self.is_cancelled())
            .field("position", &self.progress.position())
            .finish()
    }
}
