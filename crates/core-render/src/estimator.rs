//! Row height estimation.
//!
//! Rows are sampled as `RowExtent`s in document order. A row's height is the
//! distance from its start to the next row's start, which also handles rows
//! laid out side by side (the distance is then zero for all but the last in
//! a line). The final row has no successor and contributes its own extent.
//! The estimate is the arithmetic mean over all sampled rows.
//!
//! A degenerate sample (no rows, or heights summing to zero) never replaces
//! an existing estimate.

use core_model::RowExtent;
use tracing::debug;

/// Default per-row rule: distance to the next row's start, else own extent.
pub fn distance_to_next(row: &RowExtent, next: Option<&RowExtent>) -> f64 {
    match next {
        Some(next) => next.start - row.start,
        None => row.height(),
    }
}

/// Boxed per-row rule, for callers that store one.
pub type RowHeightRule = dyn Fn(&RowExtent, Option<&RowExtent>) -> f64 + Send + Sync;

/// Average row height of `rows`, or `None` for a degenerate sample.
pub fn estimate_row_height(rows: &[RowExtent]) -> Option<f64> {
    estimate_row_height_with(rows, distance_to_next)
}

/// Like [`estimate_row_height`] with a caller supplied per-row rule, for rows
/// that carry connected elements (expanded detail rows, tree children) whose
/// extent should count toward the row.
pub fn estimate_row_height_with<F>(rows: &[RowExtent], rule: F) -> Option<f64>
where
    F: Fn(&RowExtent, Option<&RowExtent>) -> f64,
{
    if rows.is_empty() {
        return None;
    }
    let total: f64 = rows
        .iter()
        .enumerate()
        .map(|(i, row)| rule(row, rows.get(i + 1)))
        .sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(total / rows.len() as f64)
}

/// Holds the last good estimate across samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowHeightEstimator {
    estimate: f64,
}

impl RowHeightEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a previously persisted estimate (`0.0` means none).
    pub fn with_estimate(estimate: f64) -> Self {
        Self { estimate }
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Sample `rows` and return the estimate now in effect.
    pub fn sample(&mut self, rows: &[RowExtent]) -> f64 {
        self.sample_with(rows, distance_to_next)
    }

    /// Like [`RowHeightEstimator::sample`] with a custom per-row rule.
    pub fn sample_with<F>(&mut self, rows: &[RowExtent], rule: F) -> f64
    where
        F: Fn(&RowExtent, Option<&RowExtent>) -> f64,
    {
        match estimate_row_height_with(rows, rule) {
            Some(h) => {
                debug!(target: "list.measure", rows = rows.len(), row_height = h, "row_height_estimated");
                self.estimate = h;
            }
            None => {
                debug!(
                    target: "list.measure",
                    rows = rows.len(),
                    kept = self.estimate,
                    "row_height_sample_degenerate"
                );
            }
        }
        self.estimate
    }
}
