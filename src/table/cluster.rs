//! Border cluster detection and rectangle merging.

use super::grid::{BorderGrid, Rect};

/// Find connected clusters of bordered cells and reduce each to its bounding
/// rectangle.
///
/// Cells are scanned in row-major order; each unvisited bordered cell seeds a
/// flood fill over its 4-connected bordered neighbors. The fill uses an
/// explicit stack so large sheets cannot exhaust the call stack. Clusters
/// with fewer than `min_size` member cells are dropped as noise.
pub fn detect_border_clusters(grid: &BorderGrid, min_size: usize) -> Vec<Rect> {
    let rows = grid.rows();
    let cols = grid.cols();
    let mut visited = BorderGrid::new(rows, cols);
    let mut clusters = Vec::new();

    for row in 1..=rows {
        for col in 1..=cols {
            if !grid.get(row, col) || visited.get(row, col) {
                continue;
            }

            let mut members = 0usize;
            let mut bounds: Option<Rect> = None;
            let mut stack = vec![(row, col)];
            while let Some((r, c)) = stack.pop() {
                if r == 0 || c == 0 || r > rows || c > cols {
                    continue;
                }
                if visited.get(r, c) || !grid.get(r, c) {
                    continue;
                }
                visited.mark(r, c);
                members += 1;
                bounds = Some(match bounds {
                    Some(b) => b.union(&Rect::new(r, c, r, c)),
                    None => Rect::new(r, c, r, c),
                });
                stack.push((r + 1, c));
                stack.push((r.wrapping_sub(1), c));
                stack.push((r, c + 1));
                stack.push((r, c.wrapping_sub(1)));
            }

            if members >= min_size {
                if let Some(b) = bounds {
                    clusters.push(b);
                }
            }
        }
    }

    clusters
}

/// Merge overlapping rectangles into union bounding boxes.
///
/// Rectangles are sorted by (top, left, bottom, right) and folded into the
/// accepted list greedily: the first accepted rectangle that overlaps the
/// candidate is replaced by their union and scanning stops for that
/// candidate. This is a single pass, not a fixed point: when an earlier merge
/// makes two already-accepted rectangles overlap, or a later candidate chains
/// A-B-C, the transitive union is NOT computed. Downstream output depends on
/// this exact behavior, so do not "fix" it to a fixed-point merge.
pub fn merge_overlapping(mut rects: Vec<Rect>) -> Vec<Rect> {
    rects.sort();

    let mut merged: Vec<Rect> = Vec::new();
    for rect in rects {
        let mut absorbed = false;
        for existing in merged.iter_mut() {
            if rect.overlaps(existing) {
                *existing = existing.union(&rect);
                absorbed = true;
                break;
            }
        }
        if !absorbed {
            merged.push(rect);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_block(rows: u32, cols: u32, block: Rect) -> BorderGrid {
        let mut grid = BorderGrid::new(rows, cols);
        for r in block.top..=block.bottom {
            for c in block.left..=block.right {
                grid.mark(r, c);
            }
        }
        grid
    }

    #[test]
    fn test_single_block_cluster() {
        // 3x3 fully bordered block: 9 members >= 4, bbox equals the block.
        let block = Rect::new(2, 2, 4, 4);
        let grid = grid_with_block(10, 10, block);

        let clusters = detect_border_clusters(&grid, 4);
        assert_eq!(clusters, vec![block]);
    }

    #[test]
    fn test_min_size_filters_noise() {
        let mut grid = BorderGrid::new(10, 10);
        // A 3-cell border fragment: below the default threshold.
        grid.mark(1, 1);
        grid.mark(1, 2);
        grid.mark(1, 3);

        assert!(detect_border_clusters(&grid, 4).is_empty());
        assert_eq!(detect_border_clusters(&grid, 3).len(), 1);
    }

    #[test]
    fn test_diagonal_cells_are_separate_clusters() {
        // 4-connectivity: diagonal neighbors do not join.
        let mut grid = BorderGrid::new(4, 4);
        grid.mark(1, 1);
        grid.mark(2, 2);

        let clusters = detect_border_clusters(&grid, 1);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_flood_fill_handles_large_sheet() {
        // A single snake-shaped cluster across a large grid; a recursive fill
        // would overflow the stack here.
        let rows = 2000u32;
        let cols = 50u32;
        let mut grid = BorderGrid::new(rows, cols);
        for r in 1..=rows {
            for c in 1..=cols {
                grid.mark(r, c);
            }
        }

        let clusters = detect_border_clusters(&grid, 4);
        assert_eq!(clusters, vec![Rect::new(1, 1, rows, cols)]);
    }

    #[test]
    fn test_merge_corner_touching_rects() {
        let rects = vec![Rect::new(1, 1, 3, 3), Rect::new(3, 3, 5, 5)];
        let merged = merge_overlapping(rects);
        assert_eq!(merged, vec![Rect::new(1, 1, 5, 5)]);
    }

    #[test]
    fn test_merge_disjoint_rects_kept() {
        let rects = vec![Rect::new(1, 1, 2, 2), Rect::new(5, 5, 6, 6)];
        let merged = merge_overlapping(rects.clone());
        assert_eq!(merged, rects);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let rects = vec![
            Rect::new(1, 1, 3, 3),
            Rect::new(2, 2, 4, 4),
            Rect::new(8, 1, 9, 2),
        ];
        let merged = merge_overlapping(rects);
        let remerged = merge_overlapping(merged.clone());
        assert_eq!(merged, remerged);
    }

    #[test]
    fn test_merged_rects_do_not_overlap() {
        let rects = vec![
            Rect::new(1, 1, 4, 4),
            Rect::new(2, 3, 6, 5),
            Rect::new(10, 1, 12, 3),
            Rect::new(11, 2, 13, 4),
        ];
        let merged = merge_overlapping(rects);
        for (i, a) in merged.iter().enumerate() {
            for b in merged.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
    }

    #[test]
    fn test_clusters_detected_in_scan_order() {
        let mut grid = BorderGrid::new(10, 10);
        for r in 6..=8 {
            for c in 1..=2 {
                grid.mark(r, c);
            }
        }
        for r in 1..=2 {
            for c in 6..=8 {
                grid.mark(r, c);
            }
        }

        let clusters = detect_border_clusters(&grid, 4);
        assert_eq!(
            clusters,
            vec![Rect::new(1, 6, 2, 8), Rect::new(6, 1, 8, 2)]
        );
    }
}
