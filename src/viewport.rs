//! Drawing surface size and resize debouncing.

use std::time::Duration;
use web_time::Instant;

/// Size of the drawing surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area viewport cannot hold a projection.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Coalesces bursts of resize events.
///
/// Each event pushes the deadline back; the resize fires once the surface
/// has been quiet for the whole window.
#[derive(Debug, Clone)]
pub struct ViewportController {
    debounce: Duration,
    last_event: Option<Instant>,
}

impl ViewportController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_event: None,
        }
    }

    /// Records a resize event from the host.
    pub fn notify_resize(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn has_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Returns `true` exactly once per burst, after the quiescence window.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(last) if now.saturating_duration_since(last) >= self.debounce => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}
