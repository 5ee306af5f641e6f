//! Display-less layout substrate.
//!
//! Rows are stacked at a fixed pixel height directly below the leading
//! spacer, so measured extents line up with the spacer arithmetic. The layout
//! handle implements `MeasurementProvider`; `renderer()` hands out a
//! `RowRenderer` writing into the same surface. Used by the demo binary and
//! by end to end tests of the engine.

use crate::{MeasurementProvider, RowRenderer};
use core_events::ScrollPosition;
use core_model::{FetchRange, RenderWindow, RowExtent, SpacerHeights};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything a headless layout currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface<T> {
    pub attached: bool,
    pub viewport_height: f64,
    pub row_pixels: f64,
    pub scroll: ScrollPosition,
    pub window: Option<FetchRange>,
    pub rows: Vec<T>,
    pub spacers: Option<SpacerHeights>,
    pub extents: Vec<RowExtent>,
    pub renders: u64,
    pub clears: u64,
}

pub struct HeadlessLayout<T> {
    shared: Arc<Mutex<Surface<T>>>,
}

impl<T> Clone for HeadlessLayout<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> HeadlessLayout<T> {
    /// An attached layout with an empty viewport of `viewport_height` pixels
    /// that lays each row out `row_pixels` tall.
    pub fn new(viewport_height: f64, row_pixels: f64) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Surface {
                attached: true,
                viewport_height,
                row_pixels,
                scroll: ScrollPosition::TOP,
                window: None,
                rows: Vec::new(),
                spacers: None,
                extents: Vec::new(),
                renders: 0,
                clears: 0,
            })),
        }
    }

    fn surface(&self) -> MutexGuard<'_, Surface<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_attached(&self, attached: bool) {
        self.surface().attached = attached;
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.surface().viewport_height = height;
    }

    /// Move the scrollbar as a user would, without notifying anyone.
    pub fn set_scroll_y(&self, y: f64) {
        self.surface().scroll.y = y;
    }

    pub fn renderer(&self) -> HeadlessRenderer<T> {
        HeadlessRenderer {
            shared: self.shared.clone(),
        }
    }

    /// Content height: both spacers plus the laid out rows.
    pub fn content_height(&self) -> f64 {
        let s = self.surface();
        let rows = s.rows.len() as f64 * s.row_pixels;
        s.spacers.map_or(rows, |sp| sp.total() + rows)
    }
}

impl<T: Clone> HeadlessLayout<T> {
    pub fn snapshot(&self) -> Surface<T> {
        self.surface().clone()
    }
}

impl<T: Send> MeasurementProvider for HeadlessLayout<T> {
    fn is_attached(&self) -> bool {
        self.surface().attached
    }

    fn viewport_height(&self) -> f64 {
        self.surface().viewport_height
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.surface().scroll
    }

    fn scroll_to(&self, position: ScrollPosition) {
        self.surface().scroll = position;
    }

    fn rendered_rows(&self) -> Vec<RowExtent> {
        self.surface().extents.clone()
    }
}

pub struct HeadlessRenderer<T> {
    shared: Arc<Mutex<Surface<T>>>,
}

impl<T: Send> RowRenderer<T> for HeadlessRenderer<T> {
    fn render_window(&mut self, window: RenderWindow<T>) {
        let mut s = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        let top = window.spacers.map_or(0.0, |sp| sp.leading);
        let px = s.row_pixels;
        s.extents = (0..window.rows.len())
            .map(|i| {
                let start = top + i as f64 * px;
                RowExtent::new(start, start + px)
            })
            .collect();
        s.window = Some(window.range);
        s.rows = window.rows;
        s.spacers = window.spacers;
        s.renders += 1;
    }

    fn resize_spacers(&mut self, spacers: Option<SpacerHeights>) {
        let mut s = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        let shift = spacers.map_or(0.0, |sp| sp.leading) - s.spacers.map_or(0.0, |sp| sp.leading);
        for extent in &mut s.extents {
            *extent = RowExtent::new(extent.start + shift, extent.end + shift);
        }
        s.spacers = spacers;
    }

    fn clear(&mut self) {
        let mut s = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        s.window = None;
        s.rows.clear();
        s.extents.clear();
        s.spacers = None;
        s.clears += 1;
    }
}
