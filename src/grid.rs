//! Grid representation and operations for color-counted puzzles.
//!
//! The grid is a rectangular array of cell states stored row-major. Cells
//! are addressed by `(row, col)` coordinates or by the linear index
//! `row * cols + col`.

use crate::geometry::Coord;

/// A color identified by its position in the puzzle's palette.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Color(pub usize);

/// The state of one grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    /// Permanently unavailable to any color.
    Blocked,
    /// Pre-filled given of the color, forbidden to every placement.
    Locked(Color),
    /// Covered by a shape placement of the color.
    Filled(Color),
}

/// A rectangular grid of cell states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Board {
    /// Creates an all-empty board.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellState::Empty; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn in_bounds(&self, (row, col): Coord) -> bool {
        (0..self.rows as i32).contains(&row) && (0..self.cols as i32).contains(&col)
    }

    /// Converts a coordinate to its linear cell index.
    #[inline]
    pub fn cell_index(&self, (row, col): Coord) -> usize {
        row as usize * self.cols + col as usize
    }

    /// Converts a linear cell index back to a coordinate.
    #[inline]
    pub fn index_coord(&self, index: usize) -> Coord {
        ((index / self.cols) as i32, (index % self.cols) as i32)
    }

    pub fn get(&self, cell: Coord) -> CellState {
        self.cells[self.cell_index(cell)]
    }

    pub fn set(&mut self, cell: Coord, state: CellState) {
        let index = self.cell_index(cell);
        self.cells[index] = state;
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cells.len()).map(|index| self.index_coord(index))
    }

    /// All cells in row-major order, paired with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, CellState)> + '_ {
        self.coords().map(|cell| (cell, self.get(cell)))
    }

    /// Coordinates of all empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Coord> {
        self.iter()
            .filter(|&(_, state)| state == CellState::Empty)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Cells of the color (filled or locked) in row `row`.
    pub fn count_in_row(&self, row: i32, color: Color) -> u32 {
        (0..self.cols as i32)
            .filter(|&col| counts_for(self.get((row, col)), color))
            .count() as u32
    }

    /// Cells of the color (filled or locked) in column `col`.
    pub fn count_in_col(&self, col: i32, color: Color) -> u32 {
        (0..self.rows as i32)
            .filter(|&row| counts_for(self.get((row, col)), color))
            .count() as u32
    }
}

/// Whether a cell state counts toward the color's row/column totals.
#[inline]
fn counts_for(state: CellState, color: Color) -> bool {
    state == CellState::Filled(color) || state == CellState::Locked(color)
}

/// Formats a board as one character per cell.
///
/// Empty cells show as '.', blocked cells as '#', locked cells as the
/// lowercase letter of their palette index and filled cells as the uppercase
/// letter ('A' for color 0, 'B' for color 1, ...).
pub fn format_board(board: &Board) -> String {
    let mut output = String::with_capacity(board.len() + board.rows());
    for row in 0..board.rows() as i32 {
        for col in 0..board.cols() as i32 {
            let display_char = match board.get((row, col)) {
                CellState::Empty => '.',
                CellState::Blocked => '#',
                CellState::Locked(Color(k)) if k < 26 => char::from(b'a' + k as u8),
                CellState::Filled(Color(k)) if k < 26 => char::from(b'A' + k as u8),
                _ => '?',
            };
            output.push(display_char);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        let board = Board::new(3, 4);
        for index in 0..board.len() {
            let cell = board.index_coord(index);
            assert!(board.in_bounds(cell));
            assert_eq!(board.cell_index(cell), index);
        }
    }

    #[test]
    fn new_board_is_all_empty() {
        let board = Board::new(2, 5);
        assert_eq!(board.empty_cells().len(), 10);
        assert!(board.iter().all(|(_, state)| state == CellState::Empty));
    }

    #[test]
    fn counts_include_locks_and_fills() {
        let mut board = Board::new(3, 3);
        board.set((0, 0), CellState::Filled(Color(0)));
        board.set((0, 1), CellState::Locked(Color(0)));
        board.set((0, 2), CellState::Filled(Color(1)));
        board.set((1, 0), CellState::Blocked);
        assert_eq!(board.count_in_row(0, Color(0)), 2);
        assert_eq!(board.count_in_row(0, Color(1)), 1);
        assert_eq!(board.count_in_row(1, Color(0)), 0);
        assert_eq!(board.count_in_col(0, Color(0)), 1);
    }

    #[test]
    fn format_shows_all_states() {
        let mut board = Board::new(3, 4);
        board.set((0, 1), CellState::Blocked);
        board.set((1, 0), CellState::Locked(Color(0)));
        board.set((1, 3), CellState::Locked(Color(1)));
        board.set((2, 2), CellState::Filled(Color(0)));
        board.set((2, 3), CellState::Filled(Color(1)));
        insta::assert_snapshot!(format_board(&board), @r"
        .#..
        a..b
        ..AB
        ");
    }
}
