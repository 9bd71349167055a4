//! File I/O for saving and loading generated puzzles.
//!
//! Binary format for `puzzle.bin` (little endian):
//! - u32: rows, u32: cols, u32: color count
//! - repeat per color: u32 name length, then that many UTF-8 bytes
//! - rows * cols cell-state bytes: 0 empty, 1 blocked, 2 + 2k locked for
//!   color k, 3 + 2k filled for color k
//! - repeat per color:
//!   - u32: placement count
//!   - repeat per placement: u32 shape id length, the id bytes, u32 rotation
//!     index, u8 anchor row, u8 anchor col, u32 cell count, then (row, col)
//!     byte pairs
//!
//! Blockers, locks, requirements and the solution are rebuilt from the grid
//! and placements on load, so they are not stored.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::geometry::Coord;
use crate::grid::{Board, CellState, Color};
use crate::puzzle::{format_puzzle, Placement, Puzzle, Requirements};

const PUZZLE_BIN: &str = "puzzle.bin";
const PUZZLE_TXT: &str = "puzzle.txt";

/// Saves a puzzle to both binary and text files in the working directory.
pub fn save(puzzle: &Puzzle) -> std::io::Result<()> {
    save_text_to(puzzle, Path::new(PUZZLE_TXT))?;
    save_binary_to(puzzle, Path::new(PUZZLE_BIN))?;
    Ok(())
}

/// Saves the human-readable rendition.
pub fn save_text_to(puzzle: &Puzzle, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    write!(file, "{}", format_puzzle(puzzle))?;
    Ok(())
}

/// Saves the compact binary rendition.
pub fn save_binary_to(puzzle: &Puzzle, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    file.write_all(&(puzzle.board.rows() as u32).to_le_bytes())?;
    file.write_all(&(puzzle.board.cols() as u32).to_le_bytes())?;
    file.write_all(&(puzzle.colors.len() as u32).to_le_bytes())?;
    for name in &puzzle.colors {
        file.write_all(&(name.len() as u32).to_le_bytes())?;
        file.write_all(name.as_bytes())?;
    }

    for (_, state) in puzzle.board.iter() {
        let byte = match state {
            CellState::Empty => 0,
            CellState::Blocked => 1,
            CellState::Locked(Color(k)) => 2 + 2 * k as u8,
            CellState::Filled(Color(k)) => 3 + 2 * k as u8,
        };
        file.write_all(&[byte])?;
    }

    for color_placements in &puzzle.placements {
        file.write_all(&(color_placements.len() as u32).to_le_bytes())?;
        for placement in color_placements {
            file.write_all(&(placement.shape.len() as u32).to_le_bytes())?;
            file.write_all(placement.shape.as_bytes())?;
            file.write_all(&(placement.rotation as u32).to_le_bytes())?;
            file.write_all(&[placement.anchor.0 as u8, placement.anchor.1 as u8])?;
            file.write_all(&(placement.cells.len() as u32).to_le_bytes())?;
            for &(row, col) in &placement.cells {
                file.write_all(&[row as u8, col as u8])?;
            }
        }
    }

    Ok(())
}

/// Loads the puzzle saved in the working directory.
pub fn load() -> Option<Puzzle> {
    load_from(Path::new(PUZZLE_BIN))
}

/// Loads a puzzle from a binary file.
pub fn load_from(path: &Path) -> Option<Puzzle> {
    let mut file = File::open(path).ok()?;

    let rows = read_u32(&mut file)? as usize;
    let cols = read_u32(&mut file)? as usize;
    let num_colors = read_u32(&mut file)? as usize;
    let mut colors = Vec::with_capacity(num_colors);
    for _ in 0..num_colors {
        colors.push(read_string(&mut file)?);
    }

    let mut board = Board::new(rows, cols);
    let mut blockers = Vec::new();
    let mut locks = vec![Vec::new(); num_colors];
    for index in 0..rows * cols {
        let byte = read_byte(&mut file)?;
        let cell = board.index_coord(index);
        let state = match byte {
            0 => CellState::Empty,
            1 => CellState::Blocked,
            _ => {
                let color = (byte as usize - 2) / 2;
                if color >= num_colors {
                    return None;
                }
                if byte % 2 == 0 {
                    CellState::Locked(Color(color))
                } else {
                    CellState::Filled(Color(color))
                }
            }
        };
        match state {
            CellState::Blocked => blockers.push(cell),
            CellState::Locked(Color(color)) => locks[color].push(cell),
            _ => {}
        }
        board.set(cell, state);
    }

    let mut placements = Vec::with_capacity(num_colors);
    for _ in 0..num_colors {
        let count = read_u32(&mut file)? as usize;
        let mut color_placements = Vec::with_capacity(count);
        for _ in 0..count {
            let shape = read_string(&mut file)?;
            let rotation = read_u32(&mut file)? as usize;
            let anchor = (
                i32::from(read_byte(&mut file)?),
                i32::from(read_byte(&mut file)?),
            );
            let cell_count = read_u32(&mut file)? as usize;
            let mut cells = Vec::with_capacity(cell_count);
            for _ in 0..cell_count {
                cells.push((
                    i32::from(read_byte(&mut file)?),
                    i32::from(read_byte(&mut file)?),
                ));
            }
            color_placements.push(Placement {
                shape,
                rotation,
                anchor,
                cells,
            });
        }
        placements.push(color_placements);
    }

    let requirements = Requirements::from_board(&board, num_colors);
    let solution = placements
        .iter()
        .zip(&locks)
        .map(|(color_placements, color_locks)| {
            let mut cells: Vec<Coord> = color_placements
                .iter()
                .flat_map(|placement| placement.cells.iter().copied())
                .chain(color_locks.iter().copied())
                .collect();
            cells.sort_unstable();
            cells
        })
        .collect();

    Some(Puzzle {
        board,
        colors,
        placements,
        blockers,
        locks,
        requirements,
        solution,
    })
}

fn read_byte(file: &mut File) -> Option<u8> {
    let mut buffer = [0u8; 1];
    file.read_exact(&mut buffer).ok()?;
    Some(buffer[0])
}

fn read_u32(file: &mut File) -> Option<u32> {
    let mut buffer = [0u8; 4];
    file.read_exact(&mut buffer).ok()?;
    Some(u32::from_le_bytes(buffer))
}

fn read_string(file: &mut File) -> Option<String> {
    let length = read_u32(file)? as usize;
    let mut buffer = vec![0u8; length];
    file.read_exact(&mut buffer).ok()?;
    String::from_utf8(buffer).ok()
}
