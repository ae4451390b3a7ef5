//! Content-aware trimming of table candidate rectangles.

use super::config::DetectionConfig;
use super::grid::{BorderMap, Rect};

/// Source of inside-border presence queries during trimming.
///
/// Only consulted when `DetectionConfig::require_inside_border` is set. A
/// failed query counts as "no inside border".
pub trait InsideBorderSource {
    /// Any inside-horizontal edge on worksheet row `row` within columns
    /// [left, right].
    fn row_has_inside_border(&self, row: u32, left: u32, right: u32) -> bool;

    /// Any inside-vertical edge on worksheet column `col` within rows
    /// [top, bottom].
    fn col_has_inside_border(&self, col: u32, top: u32, bottom: u32) -> bool;
}

/// Inside-border source that reports no borders anywhere.
pub struct NoInsideBorders;

impl InsideBorderSource for NoInsideBorders {
    fn row_has_inside_border(&self, _row: u32, _left: u32, _right: u32) -> bool {
        false
    }

    fn col_has_inside_border(&self, _col: u32, _top: u32, _bottom: u32) -> bool {
        false
    }
}

impl InsideBorderSource for BorderMap {
    fn row_has_inside_border(&self, row: u32, left: u32, right: u32) -> bool {
        (left..=right).any(|c| self.inside_horizontal.get(row, c))
    }

    fn col_has_inside_border(&self, col: u32, top: u32, bottom: u32) -> bool {
        (top..=bottom).any(|r| self.inside_vertical.get(r, col))
    }
}

fn is_empty_value(value: &str) -> bool {
    value.trim().is_empty()
}

/// Normalize possibly ragged row data to a dense 2D array matching the
/// rectangle's extent. Missing trailing cells become empty strings.
fn normalize_values(mut values: Vec<Vec<String>>, rect: &Rect) -> Vec<Vec<String>> {
    let rows = rect.rows() as usize;
    let cols = rect.cols() as usize;
    values.resize_with(rows, Vec::new);
    for row in values.iter_mut() {
        row.resize_with(cols, String::new);
    }
    values
}

/// Shrink a candidate rectangle inward based on cell content and borders.
///
/// `values` holds the rectangle's cell values row by row (ragged input is
/// padded with empty strings). Each of the four sides is trimmed in the
/// fixed order left, top, right, bottom: the boundary row/column is removed
/// while it is entirely empty, lacks an inside border (when
/// `require_inside_border` is set), or falls below the non-empty-ratio
/// threshold. Later sides see the array as already shrunk by earlier sides.
///
/// Returns the trimmed rectangle, or `None` when trimming consumed the whole
/// region (an entirely blank candidate).
pub fn shrink_to_content(
    rect: Rect,
    values: Vec<Vec<String>>,
    config: &DetectionConfig,
    inside: &dyn InsideBorderSource,
) -> Option<Rect> {
    let mut vals = normalize_values(values, &rect);
    let Rect {
        mut top,
        mut left,
        mut bottom,
        mut right,
    } = rect;

    let row_empty = |vals: &Vec<Vec<String>>, i: usize| -> bool {
        vals[i].iter().all(|v| is_empty_value(v))
    };
    let col_empty = |vals: &Vec<Vec<String>>, j: usize| -> bool {
        vals.iter().all(|row| is_empty_value(&row[j]))
    };
    let row_non_empty_ratio = |vals: &Vec<Vec<String>>, i: usize| -> f64 {
        if vals[i].is_empty() {
            return 0.0;
        }
        let filled = vals[i].iter().filter(|v| !is_empty_value(v)).count();
        filled as f64 / vals[i].len() as f64
    };
    let col_non_empty_ratio = |vals: &Vec<Vec<String>>, j: usize| -> f64 {
        if vals.is_empty() {
            return 0.0;
        }
        let filled = vals.iter().filter(|row| !is_empty_value(&row[j])).count();
        filled as f64 / vals.len() as f64
    };

    let should_trim_row =
        |vals: &Vec<Vec<String>>, i: usize, row: u32, left: u32, right: u32| -> bool {
            if row_empty(vals, i) {
                return true;
            }
            if config.require_inside_border && !inside.row_has_inside_border(row, left, right) {
                return true;
            }
            config.min_non_empty_ratio > 0.0
                && row_non_empty_ratio(vals, i) < config.min_non_empty_ratio
        };
    let should_trim_col =
        |vals: &Vec<Vec<String>>, j: usize, col: u32, top: u32, bottom: u32| -> bool {
            if col_empty(vals, j) {
                return true;
            }
            if config.require_inside_border && !inside.col_has_inside_border(col, top, bottom) {
                return true;
            }
            config.min_non_empty_ratio > 0.0
                && col_non_empty_ratio(vals, j) < config.min_non_empty_ratio
        };

    // Left
    while left <= right && !vals.is_empty() && !vals[0].is_empty() {
        if should_trim_col(&vals, 0, left, top, bottom) {
            for row in vals.iter_mut() {
                row.remove(0);
            }
            left += 1;
        } else {
            break;
        }
    }
    // Top
    while top <= bottom && !vals.is_empty() {
        if vals[0].is_empty() || should_trim_row(&vals, 0, top, left, right) {
            vals.remove(0);
            top += 1;
        } else {
            break;
        }
    }
    // Right
    while left <= right && !vals.is_empty() && !vals[0].is_empty() {
        let last = vals[0].len() - 1;
        if should_trim_col(&vals, last, right, top, bottom) {
            for row in vals.iter_mut() {
                row.pop();
            }
            right -= 1;
        } else {
            break;
        }
    }
    // Bottom
    while top <= bottom && !vals.is_empty() {
        let last = vals.len() - 1;
        if vals[last].is_empty() || should_trim_row(&vals, last, bottom, left, right) {
            vals.pop();
            bottom -= 1;
        } else {
            break;
        }
    }

    if vals.is_empty() || vals[0].is_empty() || top > bottom || left > right {
        return None;
    }
    Some(Rect {
        top,
        left,
        bottom,
        right,
    })
}
