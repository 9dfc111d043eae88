//! # Page Break Decisions
//!
//! Decides how much of the line-item table goes on the current page. A
//! header is only ever placed with rows beneath it, and a row is never split.

/// Slack for float comparisons against the page foot.
const EPSILON: f64 = 1e-6;

/// What to do with the rest of a table at the current cursor position.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Header plus every remaining row fits here.
    Place,
    /// Nothing should go here: start a new page and try again.
    MoveToNextPage,
    /// Place the header and the first `rows_on_current_page` rows, continue
    /// on the next page.
    Split { rows_on_current_page: usize },
}

/// Given the space left on a page, the header height and the heights of the
/// rows still to place, decide how to break.
pub fn decide_break(
    remaining_height: f64,
    header_height: f64,
    row_heights: &[f64],
    min_orphan_rows: usize,
    min_widow_rows: usize,
) -> BreakDecision {
    let body_space = remaining_height - header_height;
    if body_space < -EPSILON {
        return BreakDecision::MoveToNextPage;
    }

    let total: f64 = row_heights.iter().sum();
    if total <= body_space + EPSILON {
        return BreakDecision::Place;
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in row_heights {
        if running + h > body_space + EPSILON {
            break;
        }
        running += h;
        fit_count += 1;
    }

    // A header needs at least one row under it.
    let min_orphan_rows = min_orphan_rows.max(1);
    if fit_count < min_orphan_rows {
        return BreakDecision::MoveToNextPage;
    }

    let total_rows = row_heights.len();
    let carried = total_rows - fit_count;
    if carried > 0 && carried < min_widow_rows {
        let adjusted = fit_count.saturating_sub(min_widow_rows - carried);
        if adjusted < min_orphan_rows {
            return BreakDecision::MoveToNextPage;
        }
        return BreakDecision::Split {
            rows_on_current_page: adjusted,
        };
    }

    BreakDecision::Split {
        rows_on_current_page: fit_count,
    }
}
