//! Materialized window values handed to the rendering collaborator.
//!
//! A `RenderWindow` is replaced wholesale on every successful fetch; the
//! renderer never receives partial patches. Spacers are present only when
//! the dataset length is known, so the scrollbar reflects the full dataset
//! even though only `rows` are materialized.

use crate::FetchRange;

/// Pixel heights of the placeholders before and after the materialized rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpacerHeights {
    pub leading: f64,
    pub trailing: f64,
}

impl SpacerHeights {
    pub fn total(&self) -> f64 {
        self.leading + self.trailing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderWindow<T> {
    pub range: FetchRange,
    pub rows: Vec<T>,
    pub spacers: Option<SpacerHeights>,
}

impl<T> RenderWindow<T> {
    pub fn new(range: FetchRange, rows: Vec<T>, spacers: Option<SpacerHeights>) -> Self {
        Self {
            range,
            rows,
            spacers,
        }
    }
}

/// Offsets of a rendered row along the scroll axis, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowExtent {
    pub start: f64,
    pub end: f64,
}

impl RowExtent {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The row's own extent. Never negative.
    pub fn height(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}
