//! Window arithmetic and rendering-side collaborator contracts.
//!
//! Everything in this crate is synchronous and free of I/O. The engine in
//! `core-list` feeds it measurements and the current `ViewportState`, and
//! turns its decisions into store fetches and renderer calls.
//!
//! Exposed Components:
//! - `estimator`: averages sampled row extents into the single row height
//!   used by all viewport arithmetic.
//! - `viewport`: the window calculator. Pure function from scroll offset,
//!   viewport height, row height, known total and current window to either a
//!   first-page request, a "still covered" no-op, or a buffered fetch range.
//! - `spacer`: leading/trailing placeholder heights standing in for
//!   unmaterialized rows.
//! - `headless`: an in-memory substrate for the demo binary and tests.
//! - `RowRenderer` / `MeasurementProvider`: the seams to whatever substrate
//!   actually lays out rows. The core never touches that substrate directly.
//!
//! Invariants:
//! - A row height of `0.0` is "estimation pending"; no function here divides
//!   by it.
//! - Returned ranges are half-open and never start past their end.

pub mod estimator;
pub mod headless;
pub mod spacer;
pub mod viewport;

use core_events::ScrollPosition;
use core_model::{RenderWindow, RowExtent, SpacerHeights};

/// Materializes rows. Each call replaces whatever was rendered before.
pub trait RowRenderer<T>: Send {
    /// Render exactly `window.rows`, framed by `window.spacers` when present.
    fn render_window(&mut self, window: RenderWindow<T>);
    /// Resize the placeholders around the rows already rendered.
    fn resize_spacers(&mut self, spacers: Option<SpacerHeights>);
    /// Drop all materialized rows and spacers.
    fn clear(&mut self);
}

/// Read access to the layout substrate, plus the one write the engine needs
/// (restoring a scroll offset).
pub trait MeasurementProvider: Send + Sync {
    /// Whether the viewport and content containers exist and can be measured.
    fn is_attached(&self) -> bool;
    /// Visible viewport height in pixels.
    fn viewport_height(&self) -> f64;
    fn scroll_position(&self) -> ScrollPosition;
    fn scroll_to(&self, position: ScrollPosition);
    /// Extents of the currently rendered rows, in document order.
    fn rendered_rows(&self) -> Vec<RowExtent>;

    /// Viewport height when the containers are attached and non-degenerate.
    fn measurable_height(&self) -> Option<f64> {
        if !self.is_attached() {
            return None;
        }
        let h = self.viewport_height();
        (h.is_finite() && h > 0.0).then_some(h)
    }
}
