//! 2D rotation and normalization utilities.
//!
//! A polyomino has at most 4 distinct orientations under 90-degree rotation.
//! Symmetric shapes (lines, squares, crosses) have fewer.

/// A cell position as (row, col).
///
/// Signed so rotation intermediates can go negative before renormalization.
pub type Coord = (i32, i32);

/// Rotates a cell 90 degrees clockwise around the origin.
#[inline]
pub fn rotate_cw((row, col): Coord) -> Coord {
    (col, -row)
}

/// Translates cells so the minimum row and column are both zero, then sorts
/// them row-major.
///
/// Sorting makes cell-set equality plain list equality, so two orientations
/// that differ only by translation or cell order compare identical.
pub fn normalize_to_origin(mut cells: Vec<Coord>) -> Vec<Coord> {
    let min_row = cells.iter().map(|&(row, _)| row).min().unwrap();
    let min_col = cells.iter().map(|&(_, col)| col).min().unwrap();

    for (row, col) in &mut cells {
        *row -= min_row;
        *col -= min_col;
    }

    cells.sort_unstable();
    cells
}

/// Generates all unique rotations of a shape, base form first.
///
/// Applies clockwise rotations one at a time and stops as soon as a rotation
/// reproduces one already recorded. The result therefore has a deterministic
/// order: base, 90, 180, 270, truncated at the first repeat (1, 2 or 4
/// entries depending on the shape's symmetry).
pub fn unique_rotations(base: &[Coord]) -> Vec<Vec<Coord>> {
    let mut rotations = vec![normalize_to_origin(base.to_vec())];
    loop {
        let previous = rotations.last().unwrap();
        let next = normalize_to_origin(previous.iter().map(|&cell| rotate_cw(cell)).collect());
        if rotations.contains(&next) {
            return rotations;
        }
        rotations.push(next);
    }
}

/// Bounding box of normalized cells as (height, width).
pub fn bounds(cells: &[Coord]) -> (usize, usize) {
    let max_row = cells.iter().map(|&(row, _)| row).max().unwrap();
    let max_col = cells.iter().map(|&(_, col)| col).max().unwrap();
    (max_row as usize + 1, max_col as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_3: &[Coord] = &[(0, 0), (0, 1), (0, 2)];
    const SQUARE_4: &[Coord] = &[(0, 0), (0, 1), (1, 0), (1, 1)];
    const ELL_4: &[Coord] = &[(0, 0), (1, 0), (2, 0), (2, 1)];
    const CROSS_5: &[Coord] = &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)];

    #[test]
    fn rotation_counts_match_symmetry() {
        assert_eq!(unique_rotations(LINE_3).len(), 2);
        assert_eq!(unique_rotations(SQUARE_4).len(), 1);
        assert_eq!(unique_rotations(ELL_4).len(), 4);
        assert_eq!(unique_rotations(CROSS_5).len(), 1);
    }

    #[test]
    fn rotations_are_normalized_and_distinct() {
        for shape in [LINE_3, SQUARE_4, ELL_4, CROSS_5] {
            let rotations = unique_rotations(shape);
            for (i, rotation) in rotations.iter().enumerate() {
                assert_eq!(rotation.len(), shape.len(), "cell count must be stable");
                let min_row = rotation.iter().map(|&(r, _)| r).min().unwrap();
                let min_col = rotation.iter().map(|&(_, c)| c).min().unwrap();
                assert_eq!((min_row, min_col), (0, 0), "rotation {i} is not normalized");
                for other in &rotations[i + 1..] {
                    assert_ne!(rotation, other, "rotations must be pairwise distinct");
                }
            }
        }
    }

    #[test]
    fn line_rotates_between_horizontal_and_vertical() {
        let rotations = unique_rotations(LINE_3);
        assert_eq!(rotations[0], vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(rotations[1], vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn normalization_shifts_and_sorts() {
        let cells = normalize_to_origin(vec![(3, 5), (2, 5), (2, 4)]);
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn bounds_swap_under_rotation() {
        let rotations = unique_rotations(ELL_4);
        assert_eq!(bounds(&rotations[0]), (3, 2));
        assert_eq!(bounds(&rotations[1]), (2, 3));
    }
}
