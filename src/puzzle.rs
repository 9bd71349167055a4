//! Puzzle instance types shared by the solver and generator.

use crate::geometry::Coord;
use crate::grid::{self, Board, Color};

/// A shape rotation positioned on the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Shape identifier in the library.
    pub shape: String,
    /// Index into the shape's rotation list.
    pub rotation: usize,
    /// Top-left corner of the rotation's bounding box.
    pub anchor: Coord,
    /// Absolute cells covered, sorted row-major.
    pub cells: Vec<Coord>,
}

/// Per-row and per-column required cell counts, indexed `[row][color]` and
/// `[col][color]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirements {
    pub rows: Vec<Vec<u32>>,
    pub cols: Vec<Vec<u32>>,
}

impl Requirements {
    pub fn zeros(rows: usize, cols: usize, colors: usize) -> Self {
        Self {
            rows: vec![vec![0; colors]; rows],
            cols: vec![vec![0; colors]; cols],
        }
    }

    /// Counts filled and locked cells of every color per row and column.
    ///
    /// Blocked and empty cells contribute zero to all colors.
    pub fn from_board(board: &Board, colors: usize) -> Self {
        let mut requirements = Self::zeros(board.rows(), board.cols(), colors);
        for color_index in 0..colors {
            let color = Color(color_index);
            for row in 0..board.rows() {
                requirements.rows[row][color_index] = board.count_in_row(row as i32, color);
            }
            for col in 0..board.cols() {
                requirements.cols[col][color_index] = board.count_in_col(col as i32, color);
            }
        }
        requirements
    }

    pub fn num_colors(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_all_zero(&self) -> bool {
        let all_zero = |counts: &[Vec<u32>]| {
            counts
                .iter()
                .all(|per_color| per_color.iter().all(|&count| count == 0))
        };
        all_zero(&self.rows) && all_zero(&self.cols)
    }
}

/// One whole-puzzle solution.
///
/// Both fields are indexed by color: `placements[k]` are the shapes placed
/// for color `k`, and `cells[k]` are the cells that end up in that color
/// (placement cells plus the color's locked givens), sorted row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub placements: Vec<Vec<Placement>>,
    pub cells: Vec<Vec<Coord>>,
}

/// A generated puzzle together with its witness solution.
#[derive(Clone, Debug)]
pub struct Puzzle {
    pub board: Board,
    /// Palette names; `Color(k)` refers to `colors[k]`.
    pub colors: Vec<String>,
    /// Witness placements per color.
    pub placements: Vec<Vec<Placement>>,
    pub blockers: Vec<Coord>,
    /// Locked given cells per color.
    pub locks: Vec<Vec<Coord>>,
    pub requirements: Requirements,
    /// Solution cells per color (filled plus locked), sorted row-major.
    pub solution: Vec<Vec<Coord>>,
}

/// Row/column count deviations of a proposed solution, per color, plus any
/// cells claimed by more than one color.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// `actual - required`, indexed `[color][row]`.
    pub row_diffs: Vec<Vec<i64>>,
    /// `actual - required`, indexed `[color][col]`.
    pub col_diffs: Vec<Vec<i64>>,
    pub overlaps: Vec<Coord>,
}

impl ValidationReport {
    /// True when every diff is zero and no cell is claimed twice.
    pub fn is_clean(&self) -> bool {
        let flat = |diffs: &[Vec<i64>]| {
            diffs
                .iter()
                .all(|per_color| per_color.iter().all(|&diff| diff == 0))
        };
        flat(&self.row_diffs) && flat(&self.col_diffs) && self.overlaps.is_empty()
    }
}

/// Formats a puzzle as a human-readable block: the grid followed by the
/// row and column requirements of every color.
pub fn format_puzzle(puzzle: &Puzzle) -> String {
    let mut output = format!(
        "{}x{} puzzle, colors: {}\n\n",
        puzzle.board.rows(),
        puzzle.board.cols(),
        puzzle.colors.join(", ")
    );
    output.push_str(&grid::format_board(&puzzle.board));
    for (color_index, name) in puzzle.colors.iter().enumerate() {
        let counts = |per_cell: &[Vec<u32>]| {
            per_cell
                .iter()
                .map(|per_color| per_color[color_index].to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        output.push_str(&format!(
            "\n{name}: rows [{}] cols [{}]",
            counts(&puzzle.requirements.rows),
            counts(&puzzle.requirements.cols),
        ));
    }
    output.push('\n');
    output
}
