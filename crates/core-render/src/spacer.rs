//! Placeholder sizing for unmaterialized rows.
//!
//! `leading = start * h`, `trailing = max(0, total - end) * h`. Until a row
//! height has been measured `default_row_height` stands in so the scrollbar is
//! never degenerate. No spacers are produced while the total is unknown or
//! zero.

use core_model::SpacerHeights;
use std::ops::Range;

pub fn size_spacers(
    window: &Range<usize>,
    total_length: Option<usize>,
    row_height: f64,
    default_row_height: f64,
) -> Option<SpacerHeights> {
    let total = total_length.filter(|t| *t > 0)?;
    let h = if row_height > 0.0 {
        row_height
    } else {
        default_row_height
    };
    Some(SpacerHeights {
        leading: window.start as f64 * h,
        trailing: total.saturating_sub(window.end) as f64 * h,
    })
}
