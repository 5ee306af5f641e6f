//! Viewport window calculator.
//!
//! Given the scroll offset, viewport height, row height, known total and the
//! window currently rendered, decide which index range must be materialized.
//!
//! Arithmetic contract (`h` = row height, `y` = scroll offset):
//! * `visible = ceil(viewport_height / h) + 1`
//! * `needed = floor(y / h) .. floor(y / h) + visible`
//! * With a known total `needed` is cut at `total`. A window that already
//!   reaches `total` satisfies the end side under either `CoverageRule`.
//! * If the current window covers `needed` (see `CoverageRule`) nothing is
//!   fetched.
//! * Otherwise `count = max(visible, rows_per_page)` and the fetch is
//!   `needed.start - buffer .. needed.start + count + buffer`, with the start
//!   floored at 0.
//! * With a known total the start is clamped to `total - count` (0 when the
//!   dataset is smaller than one page) and the end to `total`.
//!
//! When the viewport cannot be measured, or no row height is known yet, the
//! calculator asks for the unconditional first page `0 .. rows_per_page`.
//! Index sums saturate, so any finite offset or tiny row height yields a
//! well-formed range.

use core_config::CoverageRule;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowInput {
    pub scroll_top: f64,
    /// `None` when the viewport or content containers are not measurable.
    pub viewport_height: Option<f64>,
    pub row_height: f64,
    pub total_length: Option<usize>,
    /// Window currently rendered.
    pub current: Range<usize>,
    pub rows_per_page: usize,
    pub buffer_rows: usize,
    pub coverage: CoverageRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
    /// Measurement or estimation pending: request the first page.
    FirstPage(Range<usize>),
    /// The rendered window already covers the needed rows.
    Covered { needed: Range<usize> },
    /// Fetch `range` (which contains `needed` plus buffer, unless clamped).
    Fetch {
        range: Range<usize>,
        needed: Range<usize>,
    },
}

impl WindowDecision {
    /// Range to request, if any.
    pub fn fetch_range(&self) -> Option<Range<usize>> {
        match self {
            WindowDecision::FirstPage(r) => Some(r.clone()),
            WindowDecision::Fetch { range, .. } => Some(range.clone()),
            WindowDecision::Covered { .. } => None,
        }
    }
}

/// Rows visible in a viewport of `viewport_height`, plus one for a partially
/// visible row at either edge. `row_height` must be positive.
pub fn visible_row_count(viewport_height: f64, row_height: f64) -> usize {
    debug_assert!(row_height > 0.0);
    ((viewport_height.max(0.0) / row_height).ceil() as usize).saturating_add(1)
}

/// Index range visible at `scroll_top`. `row_height` must be positive.
pub fn needed_range(scroll_top: f64, viewport_height: f64, row_height: f64) -> Range<usize> {
    let start = (sanitize_offset(scroll_top) / row_height).floor() as usize;
    start..start.saturating_add(visible_row_count(viewport_height, row_height))
}

/// Whether `current` already covers `needed` under `rule`.
pub fn covers(current: &Range<usize>, needed: &Range<usize>, rule: CoverageRule) -> bool {
    match rule {
        CoverageRule::Strict => current.start < needed.start && current.end > needed.end,
        CoverageRule::Inclusive => current.start <= needed.start && current.end >= needed.end,
    }
}

fn covers_start(current: &Range<usize>, needed: &Range<usize>, rule: CoverageRule) -> bool {
    match rule {
        CoverageRule::Strict => current.start < needed.start,
        CoverageRule::Inclusive => current.start <= needed.start,
    }
}

pub fn compute_window(input: &WindowInput) -> WindowDecision {
    let (Some(viewport_height), true) = (input.viewport_height, input.row_height > 0.0) else {
        return WindowDecision::FirstPage(first_page(input.rows_per_page, input.total_length));
    };
    let row_height = input.row_height;

    let visible = visible_row_count(viewport_height, row_height);
    let mut needed = needed_range(input.scroll_top, viewport_height, row_height);
    let mut at_end = false;
    if let Some(total) = input.total_length {
        needed.end = needed.end.min(total);
        needed.start = needed.start.min(needed.end);
        at_end = needed.end == total && input.current.end >= total;
    }
    let covered = if at_end {
        covers_start(&input.current, &needed, input.coverage)
    } else {
        covers(&input.current, &needed, input.coverage)
    };
    if covered {
        return WindowDecision::Covered { needed };
    }

    let count = visible.max(input.rows_per_page);
    let mut end = needed
        .start
        .saturating_add(count)
        .saturating_add(input.buffer_rows);
    let mut start = needed.start.saturating_sub(input.buffer_rows);
    if let Some(total) = input.total_length {
        start = start.min(total.saturating_sub(count));
        end = end.min(total).max(start);
    }
    WindowDecision::Fetch {
        range: start..end,
        needed,
    }
}

/// `0 .. rows_per_page`, cut short by a known smaller total.
pub fn first_page(rows_per_page: usize, total_length: Option<usize>) -> Range<usize> {
    let end = match total_length {
        Some(total) => rows_per_page.min(total),
        None => rows_per_page,
    };
    0..end
}

fn sanitize_offset(y: f64) -> f64 {
    if y.is_finite() && y > 0.0 { y } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(scroll_top: f64, current: Range<usize>, total: Option<usize>) -> WindowInput {
        WindowInput {
            scroll_top,
            viewport_height: Some(400.0),
            row_height: 20.0,
            total_length: total,
            current,
            rows_per_page: 25,
            buffer_rows: 10,
            coverage: CoverageRule::Strict,
        }
    }

    #[test]
    fn unmeasurable_viewport_requests_first_page() {
        let mut i = input(1000.0, 0..0, None);
        i.viewport_height = None;
        assert_eq!(compute_window(&i), WindowDecision::FirstPage(0..25));
    }

    #[test]
    fn pending_row_height_requests_first_page() {
        let mut i = input(1000.0, 40..85, None);
        i.row_height = 0.0;
        assert_eq!(compute_window(&i), WindowDecision::FirstPage(0..25));
    }

    #[test]
    fn first_page_shrinks_to_small_total() {
        assert_eq!(first_page(25, Some(7)), 0..7);
        assert_eq!(first_page(25, None), 0..25);
    }

    #[test]
    fn steady_scroll_window() {
        let d = compute_window(&input(1000.0, 0..25, None));
        assert_eq!(
            d,
            WindowDecision::Fetch {
                range: 40..85,
                needed: 50..71,
            }
        );
    }

    #[test]
    fn visible_count_rounds_up_plus_one() {
        assert_eq!(visible_row_count(400.0, 20.0), 21);
        assert_eq!(visible_row_count(410.0, 20.0), 22);
        assert_eq!(needed_range(1019.0, 400.0, 20.0), 50..71);
    }

    #[test]
    fn negative_or_nan_offset_is_top() {
        assert_eq!(needed_range(-50.0, 400.0, 20.0), 0..21);
        assert_eq!(needed_range(f64::NAN, 400.0, 20.0), 0..21);
    }

    #[test]
    fn strict_coverage_requires_margin_on_both_sides() {
        let needed = 50..71;
        assert!(covers(&(40..85), &needed, CoverageRule::Strict));
        assert!(!covers(&(50..85), &needed, CoverageRule::Strict));
        assert!(!covers(&(40..71), &needed, CoverageRule::Strict));
        assert!(covers(&(50..71), &needed, CoverageRule::Inclusive));
        assert!(!covers(&(51..71), &needed, CoverageRule::Inclusive));
    }

    #[test]
    fn covered_window_short_circuits() {
        let d = compute_window(&input(1000.0, 40..85, Some(1000)));
        assert_eq!(d, WindowDecision::Covered { needed: 50..71 });
        assert_eq!(d.fetch_range(), None);
    }

    #[test]
    fn window_touching_needed_start_refetches_under_strict_rule() {
        let d = compute_window(&input(1000.0, 50..85, Some(1000)));
        assert!(matches!(d, WindowDecision::Fetch { .. }));
        let mut inclusive = input(1000.0, 50..85, Some(1000));
        inclusive.coverage = CoverageRule::Inclusive;
        assert_eq!(
            compute_window(&inclusive),
            WindowDecision::Covered { needed: 50..71 }
        );
    }

    #[test]
    fn known_total_clamps_near_end() {
        // Scrolled to row 990 of 1000: start pulled back so a full page fits.
        let d = compute_window(&input(19_800.0, 0..25, Some(1000)));
        assert_eq!(
            d,
            WindowDecision::Fetch {
                range: 975..1000,
                needed: 990..1000,
            }
        );
    }

    #[test]
    fn window_reaching_total_covers_bottom_scroll() {
        // 1000 rows, scrolled to the last offset with 970..1000 rendered.
        let d = compute_window(&input(19_600.0, 970..1000, Some(1000)));
        assert_eq!(d, WindowDecision::Covered { needed: 980..1000 });
        let d = compute_window(&input(19_590.0, 970..1000, Some(1000)));
        assert_eq!(d, WindowDecision::Covered { needed: 979..1000 });
        // Start side still follows the rule.
        let d = compute_window(&input(19_400.0, 970..1000, Some(1000)));
        assert_eq!(d.fetch_range(), Some(960..1000));
    }

    #[test]
    fn huge_offset_saturates_instead_of_overflowing() {
        let d = compute_window(&input(1.0e30, 0..25, None));
        let range = d.fetch_range().unwrap();
        assert!(range.start <= range.end);
        assert_eq!(range.end, usize::MAX);

        let d = compute_window(&input(1.0e30, 0..25, Some(1000)));
        assert_eq!(d.fetch_range(), Some(975..1000));
        assert_eq!(visible_row_count(400.0, f64::MIN_POSITIVE), usize::MAX);
    }

    #[test]
    fn small_dataset_clamps_to_zero() {
        let d = compute_window(&input(200.0, 0..0, Some(12)));
        assert_eq!(d.fetch_range(), Some(0..12));
    }

    #[test]
    fn tall_viewport_uses_visible_count_over_page_size() {
        let mut i = input(0.0, 0..0, None);
        i.viewport_height = Some(1000.0); // 51 visible rows > 25 per page
        assert_eq!(
            compute_window(&i),
            WindowDecision::Fetch {
                range: 0..61,
                needed: 0..51,
            }
        );
    }
}
