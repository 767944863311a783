//! Timer-based debounce used for hover-triggered preview playback: the
//! action fires only after the pointer has rested for the full delay, and a
//! pointer-leave before then cancels it. Decoupled from any rendering
//! surface so the scheduling is testable on its own.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Delay before a hovered video starts its preview playback.
pub const HOVER_PREVIEW_DELAY: Duration = Duration::from_millis(300);

/// Arms a single pending callback at a time; scheduling again or cancelling
/// disarms the previous one. Dropping the debouncer disarms as well.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Debouncer tuned for hover previews.
    pub fn hover_preview() -> Self {
        Self::new(HOVER_PREVIEW_DELAY)
    }

    /// Schedules `action` to run after the delay, replacing any pending one.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            action();
        }));
    }

    /// Disarms the pending action, if any. No effect once it has fired.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
