//! Render debouncing as a pure policy object.
//!
//! The embedder owns the clock and the timer; this type only answers
//! "should a render fire now?". Every camera mutation restarts the quiet
//! window, so a drag stream coalesces into one render.

use std::time::{Duration, Instant};

/// Quiet window between the last camera mutation and the render it triggers.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(80);

#[derive(Clone, Debug)]
pub struct RenderDebouncer {
    window: Duration,
    dirty_since: Option<Instant>,
}

impl RenderDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            dirty_since: None,
        }
    }

    /// Record a camera mutation at `now`, restarting the quiet window.
    pub fn note_mutation(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// True exactly once per mutation burst, when the window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.dirty_since {
            Some(since) if now.duration_since(since) >= self.window => {
                self.dirty_since = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for RenderDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
