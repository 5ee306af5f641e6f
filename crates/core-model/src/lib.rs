//! Data model for the on-demand windowing engine.
//!
//! A list instance owns exactly one `ViewportState`. The window calculator
//! writes the index/offset fields when it decides on a range; the fetch
//! coordinator writes the resolved window and total length after a fetch
//! settles. Nothing else mutates it.
//!
//! Core invariants (must hold after every public call):
//! * `starting_index <= end_index`.
//! * `row_height == 0.0` means "estimation pending": no arithmetic divides by
//!   it, callers fall back to a first-page fetch instead.
//! * When `total_length` is known the window never extends past it, except
//!   for a request issued before the total was first resolved.
//!
//! `FetchRange` values are immutable once issued. The `generation` stamped on
//! each one increases monotonically per instance; only the resolution carrying
//! the latest generation may touch `ViewportState` or the renderer.

mod window;
pub use window::{RenderWindow, RowExtent, SpacerHeights};

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    pub starting_index: usize,
    pub end_index: usize,
    /// Dataset length; `None` until the store first resolves it.
    pub total_length: Option<usize>,
    /// Average row height in pixels; `0.0` until measured.
    pub row_height: f64,
    pub scroll_offset_y: f64,
}

impl ViewportState {
    pub fn window(&self) -> Range<usize> {
        self.starting_index..self.end_index
    }

    pub fn has_row_height(&self) -> bool {
        self.row_height > 0.0
    }

    /// Forget the rendered window and total while keeping the row height
    /// estimate, which stays valid across a data reload.
    pub fn reset_window(&mut self) {
        self.starting_index = 0;
        self.end_index = 0;
        self.total_length = None;
        self.scroll_offset_y = 0.0;
    }

    /// Record a settled fetch.
    pub fn apply_fetch(&mut self, range: &FetchRange, total_length: usize) {
        debug_assert!(range.start <= range.end);
        self.starting_index = range.start;
        self.end_index = range.end;
        self.total_length = Some(total_length);
    }
}

/// A range request issued to the backing store. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchRange {
    pub start: usize,
    pub end: usize,
    pub generation: u64,
}

impl FetchRange {
    /// Build a range; a reversed pair collapses to an empty range at `start`.
    pub fn new(start: usize, end: usize, generation: u64) -> Self {
        Self {
            start,
            end: end.max(start),
            generation,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}
