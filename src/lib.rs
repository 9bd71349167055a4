//! Color-Counted Polyomino Puzzle Engine
//!
//! Provides the core functionality for a two-dimensional polyomino puzzle:
//! a backtracking solver that recovers shape placements from per-row and
//! per-column color counts, and a randomized generator that constructs
//! puzzles guaranteed to have at least one solution.

pub mod error;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod puzzle;
pub mod shapes;
pub mod solver;
