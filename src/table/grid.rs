//! Border grids, rectangles, and A1 range addresses.

use crate::error::{Error, Result};

/// A rectangular cell region, 1-based and inclusive on all sides.
///
/// Field order matters: the derived ordering sorts by
/// (top, left, bottom, right), which the merge pass relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rect {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Rect {
    /// Create a rectangle; panics in debug builds when inverted.
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        debug_assert!(top <= bottom && left <= right);
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Number of rows covered.
    pub fn rows(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Number of columns covered.
    pub fn cols(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Covered cell count.
    pub fn area(&self) -> u64 {
        u64::from(self.rows()) * u64::from(self.cols())
    }

    /// Axis-aligned overlap test (touching counts as overlapping).
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.left > other.right
            || self.right < other.left
            || self.top > other.bottom
            || self.bottom < other.top)
    }

    /// Union bounding box of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }

    /// Format as an A1 range address, e.g. "B2:D10".
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            col_to_letters(self.left),
            self.top,
            col_to_letters(self.right),
            self.bottom
        )
    }

    /// Parse an A1 range address ("B2:D10" or a single cell "B2").
    ///
    /// Absolute markers (`$`) are accepted and ignored.
    pub fn parse_a1(s: &str) -> Result<Rect> {
        let s = s.trim();
        let (first, second) = match s.split_once(':') {
            Some((a, b)) => (a, b),
            None => (s, s),
        };
        let (left, top) = parse_cell_ref(first)?;
        let (right, bottom) = parse_cell_ref(second)?;
        if top > bottom || left > right {
            return Err(Error::InvalidData(format!("inverted range: {}", s)));
        }
        Ok(Rect {
            top,
            left,
            bottom,
            right,
        })
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Convert a 1-based column number to letters (1 -> "A", 28 -> "AB").
pub fn col_to_letters(mut col: u32) -> String {
    debug_assert!(col >= 1);
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters to a 1-based column number ("AB" -> 28).
pub fn letters_to_col(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidData("empty column letters".to_string()));
    }
    let mut col: u32 = 0;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(Error::InvalidData(format!(
                "invalid column letter: {}",
                letters
            )));
        }
        col = col * 26 + (upper as u32 - 'A' as u32 + 1);
    }
    Ok(col)
}

/// Parse a single cell reference like "B2" or "$B$2" into (col, row), both
/// 1-based.
pub fn parse_cell_ref(cell: &str) -> Result<(u32, u32)> {
    let cleaned: String = cell.chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| Error::InvalidData(format!("invalid cell reference: {}", cell)))?;
    let (letters, digits) = cleaned.split_at(split);
    let col = letters_to_col(letters)?;
    let row: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidData(format!("invalid cell reference: {}", cell)))?;
    if row == 0 {
        return Err(Error::InvalidData(format!("row must be 1-based: {}", cell)));
    }
    Ok((col, row))
}

/// Per-cell border presence over a worksheet's used range.
///
/// Coordinates are 1-based; out-of-range queries return false. Built once per
/// sheet by a border map loader, then treated as immutable.
#[derive(Debug, Clone)]
pub struct BorderGrid {
    rows: u32,
    cols: u32,
    cells: Vec<bool>,
}

impl BorderGrid {
    /// Create an all-false grid covering [1..rows] x [1..cols].
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows as usize * cols as usize],
        }
    }

    /// Number of rows covered.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns covered.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row == 0 || col == 0 || row > self.rows || col > self.cols {
            return None;
        }
        Some((row as usize - 1) * self.cols as usize + (col as usize - 1))
    }

    /// Mark a cell as bordered. Out-of-range coordinates are ignored.
    pub fn mark(&mut self, row: u32, col: u32) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = true;
        }
    }

    /// Border presence at a cell; false when out of range.
    pub fn get(&self, row: u32, col: u32) -> bool {
        self.index(row, col).map(|i| self.cells[i]).unwrap_or(false)
    }

    /// Count of bordered cells.
    pub fn marked_count(&self) -> usize {
        self.cells.iter().filter(|b| **b).count()
    }
}

/// Border maps for one worksheet: overall presence plus per-axis inside-edge
/// presence.
///
/// The two inside grids are kept separate because trimming checks them on
/// different axes: a column survives on inside-vertical edges, a row on
/// inside-horizontal ones.
#[derive(Debug, Clone)]
pub struct BorderMap {
    /// True where any of the six border edges is visible
    pub any: BorderGrid,
    /// True where an inside-vertical edge (between columns) is visible
    pub inside_vertical: BorderGrid,
    /// True where an inside-horizontal edge (between rows) is visible
    pub inside_horizontal: BorderGrid,
    /// Used-range row extent
    pub max_row: u32,
    /// Used-range column extent
    pub max_col: u32,
}

impl BorderMap {
    /// Create an empty border map with the given extents.
    pub fn new(max_row: u32, max_col: u32) -> Self {
        Self {
            any: BorderGrid::new(max_row, max_col),
            inside_vertical: BorderGrid::new(max_row, max_col),
            inside_horizontal: BorderGrid::new(max_row, max_col),
            max_row,
            max_col,
        }
    }
}
