//! Reading-order reconstruction for two-column pages
//!
//! Regions are split into a left and a right column at the widest gap
//! between horizontal box centers (the gutter). Each column is then read
//! top to bottom, left column first.
//!
//! The split always produces two columns. Single-column or three-column
//! pages are still cut at their widest center gap, which gives a wrong but
//! deterministic order for those layouts.
//!
//! # Example
//! ```
//! use pagetext_common::{BBox, TextRegion};
//! use pagetext_reading_order::resolve;
//!
//! let region = |x1, y1| TextRegion::new(BBox::new(x1, y1, x1 + 100, y1 + 40).unwrap());
//! let ordered = resolve(&[region(150, 0), region(0, 50), region(0, 0)]);
//!
//! let starts: Vec<_> = ordered.iter().map(|r| (r.bbox.x1(), r.bbox.y1())).collect();
//! assert_eq!(starts, vec![(0, 0), (0, 50), (150, 0)]);
//! ```

use pagetext_common::TextRegion;
use tracing::debug;

/// Result of splitting regions at the gutter.
///
/// `left` and `right` hold indices into the input slice, each already in
/// top-to-bottom order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSplit {
    /// Midpoint of the widest gap between sorted centers
    pub boundary: f64,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

impl ColumnSplit {
    /// Input indices in reading order
    pub fn reading_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.left.iter().chain(self.right.iter()).copied()
    }
}

/// Split `regions` into two columns.
///
/// Returns `None` for fewer than two regions, where there is no gap to
/// split at.
#[must_use]
pub fn split_columns(regions: &[TextRegion]) -> Option<ColumnSplit> {
    if regions.len() < 2 {
        return None;
    }

    let centers: Vec<f64> = regions.iter().map(|r| r.bbox.center_x()).collect();

    // Stable, so equal centers keep input order
    let mut sorted: Vec<f64> = centers.clone();
    sorted.sort_by(f64::total_cmp);

    // First maximal gap wins on ties
    let mut gutter = 0;
    let mut widest = f64::NEG_INFINITY;
    for (i, pair) in sorted.windows(2).enumerate() {
        let gap = pair[1] - pair[0];
        if gap > widest {
            widest = gap;
            gutter = i;
        }
    }
    let boundary = (sorted[gutter] + sorted[gutter + 1]) / 2.0;

    let (mut left, mut right): (Vec<usize>, Vec<usize>) =
        (0..regions.len()).partition(|&i| centers[i] < boundary);

    left.sort_by_key(|&i| regions[i].bbox.y1());
    right.sort_by_key(|&i| regions[i].bbox.y1());

    debug!(
        "Gutter at x={boundary} (gap {widest}): {} left, {} right",
        left.len(),
        right.len()
    );

    Some(ColumnSplit {
        boundary,
        left,
        right,
    })
}

/// Order `regions` for reading: left column top to bottom, then the right.
///
/// The output is a permutation of the input. Regions sharing a column and
/// a top edge keep their input order.
#[must_use]
pub fn resolve(regions: &[TextRegion]) -> Vec<TextRegion> {
    match split_columns(regions) {
        Some(split) => split.reading_order().map(|i| regions[i].clone()).collect(),
        None => regions.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetext_common::BBox;

    /// Region whose center is `cx` (box is `cx - 5 ..= cx + 5`)
    fn centered(cx: i32, y1: i32) -> TextRegion {
        TextRegion::new(BBox::new(cx - 5, y1, cx + 5, y1 + 10).unwrap())
    }

    fn corners(regions: &[TextRegion]) -> Vec<(i32, i32)> {
        regions.iter().map(|r| (r.bbox.x1(), r.bbox.y1())).collect()
    }

    #[test]
    fn test_empty() {
        assert!(resolve(&[]).is_empty());
        assert!(split_columns(&[]).is_none());
    }

    #[test]
    fn test_single_region_unchanged() {
        let region = centered(40, 7);
        assert_eq!(resolve(std::slice::from_ref(&region)), vec![region]);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_split_at_widest_gap() {
        let regions = vec![centered(90, 0), centered(10, 0), centered(95, 0), centered(12, 0)];
        let split = split_columns(&regions).unwrap();

        assert_eq!(split.boundary, 51.0);
        assert_eq!(split.left, vec![1, 3]);
        assert_eq!(split.right, vec![0, 2]);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_first_maximal_gap_wins() {
        // Gaps 40 and 40: the first one is the gutter
        let regions = vec![centered(10, 0), centered(50, 0), centered(90, 0)];
        let split = split_columns(&regions).unwrap();

        assert_eq!(split.boundary, 30.0);
        assert_eq!(split.left, vec![0]);
        assert_eq!(split.right, vec![1, 2]);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_region_on_boundary_goes_right() {
        // Only identical centers put the boundary on a center
        let same = vec![centered(50, 30), centered(50, 10)];
        let split = split_columns(&same).unwrap();
        assert_eq!(split.boundary, 50.0);
        assert!(split.left.is_empty());
        assert_eq!(split.right, vec![1, 0]);
    }

    #[test]
    fn test_columns_sorted_by_top() {
        let regions = vec![
            centered(300, 400),
            centered(50, 300),
            centered(300, 100),
            centered(50, 100),
        ];
        assert_eq!(
            corners(&resolve(&regions)),
            vec![(45, 100), (45, 300), (295, 100), (295, 400)]
        );
    }

    #[test]
    fn test_equal_tops_keep_input_order() {
        let first = TextRegion::new(BBox::new(0, 10, 20, 30).unwrap());
        let second = TextRegion::new(BBox::new(2, 10, 18, 40).unwrap());
        let right = centered(500, 0);

        let ordered = resolve(&[first.clone(), right.clone(), second.clone()]);
        assert_eq!(ordered, vec![first, second, right]);
    }

    #[test]
    fn test_single_column_still_split() {
        // One column with slightly jittered centers: cut at the widest jitter
        let regions = vec![centered(100, 0), centered(103, 50), centered(101, 100)];
        let ordered = resolve(&regions);
        assert_eq!(corners(&ordered), vec![(95, 0), (96, 100), (98, 50)]);
    }
}
