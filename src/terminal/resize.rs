//! Viewport geometry and resize coalescing.

use std::time::Duration;

use tokio::time::Instant;

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Trailing-edge debounce for viewport changes.
///
/// Each change restarts the quiet period; only the geometry present when the
/// period elapses is released.
#[derive(Debug, Clone)]
pub struct ResizeCoalescer {
    delay: Duration,
    pending: Option<(Viewport, Instant)>,
}

impl ResizeCoalescer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a viewport change observed at `now`
    pub fn observe(&mut self, viewport: Viewport, now: Instant) {
        self.pending = Some((viewport, now + self.delay));
    }

    /// Release the pending geometry once its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        match self.pending {
            Some((viewport, due)) if now >= due => {
                self.pending = None;
                Some(viewport)
            }
            _ => None,
        }
    }

    /// When the pending change becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, due)| due)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
