//! Progress monitoring and cooperative cancellation for blocking recognition.
//!
//! A [`ProgressMonitor`] is a context object passed by reference into a
//! blocking recognition call. The engine writes progress into it while the
//! call runs; another thread may read it for reporting and may request
//! cancellation, which the engine checks on its own schedule. Nothing here
//! touches engine state.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MonitorState {
    progress: AtomicI32,
    words: AtomicI32,
    cancelled: AtomicBool,
}

/// Shared progress/cancel context for one recognition pass
#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    state: Arc<MonitorState>,
    deadline: Option<Duration>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to stop once `deadline` has elapsed from the start of
    /// recognition
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Percent complete, 0 to 100
    pub fn progress(&self) -> i32 {
        self.state.progress.load(Ordering::Acquire)
    }

    /// Words recognized so far, as last reported by the engine
    pub fn words(&self) -> i32 {
        self.state.words.load(Ordering::Acquire)
    }

    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Called from the engine side when it reports progress
    pub fn record_progress(&self, percent: i32) {
        self.state.progress.store(percent.clamp(0, 100), Ordering::Release);
    }

    /// Called from the engine side when it polls for cancellation
    pub fn record_words(&self, words: i32) {
        self.state.words.store(words, Ordering::Release);
    }

    /// Stable address of the shared state, used as the native callback
    /// context. Valid for as long as any clone of this monitor is alive.
    #[cfg(feature = "engine-tesseract")]
    pub(crate) fn context_ptr(&self) -> *const () {
        Arc::as_ptr(&self.state) as *const ()
    }

    /// Recover a monitor view from a native callback context.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`ProgressMonitor::context_ptr`] on a monitor that
    /// is still alive.
    #[cfg(feature = "engine-tesseract")]
    pub(crate) unsafe fn from_context<'a>(ptr: *const ()) -> ProgressMonitorRef<'a> {
        ProgressMonitorRef {
            state: &*(ptr as *const MonitorState),
        }
    }
}

/// Borrowed monitor view handed to native callbacks
#[cfg(feature = "engine-tesseract")]
pub(crate) struct ProgressMonitorRef<'a> {
    state: &'a MonitorState,
}

#[cfg(feature = "engine-tesseract")]
impl ProgressMonitorRef<'_> {
    pub(crate) fn record_progress(&self, percent: i32) {
        self.state.progress.store(percent.clamp(0, 100), Ordering::Release);
    }

    pub(crate) fn record_words(&self, words: i32) {
        self.state.words.store(words, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let monitor = ProgressMonitor::new();
        let observer = monitor.clone();

        monitor.record_progress(42);
        monitor.record_words(7);
        assert_eq!(observer.progress(), 42);
        assert_eq!(observer.words(), 7);

        observer.cancel();
        assert!(monitor.is_cancelled());
    }

    #[test]
    fn test_progress_is_clamped() {
        let monitor = ProgressMonitor::new();
        monitor.record_progress(250);
        assert_eq!(monitor.progress(), 100);
        monitor.record_progress(-3);
        assert_eq!(monitor.progress(), 0);
    }

    #[test]
    fn test_deadline_is_optional() {
        assert_eq!(ProgressMonitor::new().deadline(), None);
        let monitor = ProgressMonitor::new().with_deadline(Duration::from_millis(1500));
        assert_eq!(monitor.deadline(), Some(Duration::from_millis(1500)));
    }
}
