//! Viewport event types consumed by the on-demand list engine.
//!
//! Raw scroll signals arrive at a high rate and are funneled through the
//! coalescer (`core-input`) before reaching the window calculator. Resize and
//! refresh are issued directly by the host.

/// Scroll offset of the viewport along both axes, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub const TOP: ScrollPosition = ScrollPosition { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single scroll signal.
///
/// `scroll_top` carries the offset observed when the signal fired, if the
/// source reported one. A missing or zero value falls back to the offset the
/// measurement provider reports when the event is processed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollEvent {
    pub scroll_top: Option<f64>,
}

impl ScrollEvent {
    pub const fn at(scroll_top: f64) -> Self {
        Self {
            scroll_top: Some(scroll_top),
        }
    }

    /// Signal without an observed offset.
    pub const fn unpositioned() -> Self {
        Self { scroll_top: None }
    }

    /// The carried offset when it is usable (present, finite and non-zero).
    pub fn observed_top(&self) -> Option<f64> {
        self.scroll_top.filter(|y| y.is_finite() && *y != 0.0)
    }
}

/// Per-call refresh options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOptions {
    /// Overrides the instance `keep_scroll_position` for this call only.
    pub keep_scroll_position: Option<bool>,
}

impl RefreshOptions {
    pub const fn keep_scroll_position(keep: bool) -> Self {
        Self {
            keep_scroll_position: Some(keep),
        }
    }

    pub fn resolve_keep(&self, instance_default: bool) -> bool {
        self.keep_scroll_position.unwrap_or(instance_default)
    }
}

/// Everything that can trigger a window recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Scroll(ScrollEvent),
    Resize,
    Refresh(RefreshOptions),
}
