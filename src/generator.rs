//! Randomized construction of solvable puzzles.
//!
//! Generation runs a wall-clock-budgeted outer loop of independent attempts.
//! Each attempt allocates per-color shape budgets, selects random shapes,
//! splits the leftover cells into blocker and lock budgets, lays everything
//! out under a random strategy and derives the row/column requirements from
//! the finished grid. The laid-out grid is the witness that the puzzle is
//! solvable.

use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::geometry::Coord;
use crate::grid::{Board, CellState, Color};
use crate::puzzle::{Placement, Puzzle, Requirements};
use crate::shapes::ShapeLibrary;
use crate::solver::MAX_GRID_CELLS;

/// Inner layout attempts before falling back to scattered blockers.
const PLACEMENT_ATTEMPTS: usize = 5;

/// Random-cell attempts allowed per blocker or lock, times the budget.
const SCATTER_ATTEMPT_FACTOR: usize = 10;

/// Everything `generate` needs to know.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub cols: usize,
    /// Palette names; `Color(k)` refers to `colors[k]`.
    pub colors: Vec<String>,
    pub blockers: bool,
    pub locks: bool,
    /// Shape ids to draw from. Empty means the whole library.
    pub shape_pool: Vec<String>,
    /// Wall-clock budget for the outer retry loop.
    pub time_budget: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 5,
            colors: vec!["green".to_string(), "blue".to_string()],
            blockers: true,
            locks: false,
            shape_pool: Vec::new(),
            time_budget: Duration::from_millis(4000),
        }
    }
}

/// Blocker layout policy for one attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Strategy {
    /// Blockers mirrored to the four symmetric positions.
    Symmetrical,
    /// Uniform random cells.
    Chaotic,
}

/// One selected shape instance: library index plus rotation index.
#[derive(Clone, Copy)]
struct ShapePick {
    shape: usize,
    rotation: usize,
}

/// Generates a puzzle with the thread-local random source.
pub fn generate(library: &ShapeLibrary, config: &GeneratorConfig) -> Result<Puzzle> {
    generate_with_rng(library, config, &mut rand::thread_rng())
}

/// Generates a puzzle, drawing all randomness from `rng`.
///
/// Retries failed attempts until the configured time budget elapses, then
/// returns [`Error::DeadlineExceeded`]. At least one attempt always runs.
pub fn generate_with_rng(
    library: &ShapeLibrary,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Result<Puzzle> {
    let pool = resolve_pool(library, config)?;
    let deadline = Instant::now() + config.time_budget;

    loop {
        match attempt(library, &pool, config, rng) {
            Ok(puzzle) => return Ok(puzzle),
            Err(error) => debug!("generation attempt failed: {error}"),
        }
        if Instant::now() >= deadline {
            return Err(Error::DeadlineExceeded);
        }
    }
}

fn resolve_pool(library: &ShapeLibrary, config: &GeneratorConfig) -> Result<Vec<usize>> {
    let cells = config.rows * config.cols;
    if cells == 0 {
        return Err(Error::InvalidConfig("grid has no cells".to_string()));
    }
    if cells > MAX_GRID_CELLS {
        return Err(Error::InvalidConfig(format!(
            "grid of {cells} cells exceeds the {MAX_GRID_CELLS}-cell limit"
        )));
    }
    if config.colors.is_empty() {
        return Err(Error::InvalidConfig("palette has no colors".to_string()));
    }

    if config.shape_pool.is_empty() {
        if library.shapes().is_empty() {
            return Err(Error::InvalidConfig("shape library is empty".to_string()));
        }
        return Ok((0..library.shapes().len()).collect());
    }
    config
        .shape_pool
        .iter()
        .map(|id| {
            library
                .index_of(id)
                .ok_or_else(|| Error::InvalidConfig(format!("unknown shape id {id:?}")))
        })
        .collect()
}

/// One full pass through the seven-phase pipeline.
fn attempt(
    library: &ShapeLibrary,
    pool: &[usize],
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Result<Puzzle> {
    let shapes = library.shapes();
    let num_colors = config.colors.len();
    let cells = config.rows * config.cols;

    // phase 1: budgets, with cells held back for blockers and locks
    let reserve = if config.blockers || config.locks {
        2 * (config.rows + config.cols) / 3
    } else {
        0
    };
    let shape_budget = cells.saturating_sub(reserve) / num_colors;

    // phase 2: random shapes per color until nothing fits the budget
    let mut picks: Vec<Vec<ShapePick>> = Vec::with_capacity(num_colors);
    let mut remainder_total = 0;
    for _ in 0..num_colors {
        let mut remaining = shape_budget;
        let mut list = Vec::new();
        loop {
            let fits: Vec<usize> = pool
                .iter()
                .copied()
                .filter(|&shape| shapes[shape].cell_count <= remaining)
                .collect();
            let Some(&shape) = fits.choose(rng) else {
                break;
            };
            let rotation = rng.gen_range(0..shapes[shape].rotations.len());
            remaining -= shapes[shape].cell_count;
            list.push(ShapePick { shape, rotation });
        }
        if list.is_empty() {
            return Err(Error::NoShapesFit);
        }
        remainder_total += remaining;
        picks.push(list);
    }

    // phase 3: split the leftover cells
    let total_remainder = remainder_total + reserve;
    let (blocker_budget, lock_budget) = match (config.blockers, config.locks) {
        (true, true) => (total_remainder / 2, total_remainder - total_remainder / 2),
        (true, false) => (total_remainder, 0),
        (false, true) => (0, total_remainder),
        (false, false) => (0, 0),
    };

    // phase 4: locks per color, remainder to random colors
    let mut lock_counts = vec![lock_budget / num_colors; num_colors];
    for _ in 0..lock_budget % num_colors {
        lock_counts[rng.gen_range(0..num_colors)] += 1;
    }

    // phase 5
    let strategy = if rng.gen_bool(0.5) {
        Strategy::Symmetrical
    } else {
        Strategy::Chaotic
    };
    debug!(
        "attempt: budget={shape_budget} blockers={blocker_budget} locks={lock_counts:?} {strategy:?}"
    );

    // phase 6: lay out blockers, locks and shapes
    for _ in 0..PLACEMENT_ATTEMPTS {
        let mut board = Board::new(config.rows, config.cols);
        let Ok(blockers) = place_blockers(&mut board, blocker_budget, strategy, rng) else {
            continue;
        };
        let Ok(locks) = place_locks(&mut board, &lock_counts, rng) else {
            continue;
        };
        let Ok(placements) = place_shapes(&mut board, library, &picks, rng) else {
            continue;
        };
        return Ok(finalize(board, config, placements, blockers, locks));
    }

    // fallback: shapes first on an empty grid, then scatter the rest
    let mut board = Board::new(config.rows, config.cols);
    let placements = place_shapes(&mut board, library, &picks, rng)?;
    let (blockers, locks) = scatter_blockers_and_locks(&mut board, blocker_budget, &lock_counts, rng);
    Ok(finalize(board, config, placements, blockers, locks))
}

fn place_blockers(
    board: &mut Board,
    count: usize,
    strategy: Strategy,
    rng: &mut impl Rng,
) -> Result<Vec<Coord>> {
    match strategy {
        Strategy::Symmetrical => Ok(place_blockers_symmetrical(board, count, rng)),
        Strategy::Chaotic => place_blockers_chaotic(board, count, rng),
    }
}

/// Mirrors each random upper-left seed to its four symmetric positions,
/// skipping occupied cells, until the count is reached.
///
/// Runs uncapped; every empty cell is the mirror of some seed, so progress
/// is guaranteed while `count` does not exceed the empty cells.
fn place_blockers_symmetrical(board: &mut Board, count: usize, rng: &mut impl Rng) -> Vec<Coord> {
    let rows = board.rows() as i32;
    let cols = board.cols() as i32;
    let mut placed = Vec::with_capacity(count);

    while placed.len() < count {
        let row = rng.gen_range(0..(rows + 1) / 2);
        let col = rng.gen_range(0..(cols + 1) / 2);
        let mirrors = [
            (row, col),
            (row, cols - 1 - col),
            (rows - 1 - row, col),
            (rows - 1 - row, cols - 1 - col),
        ];
        for cell in mirrors {
            if placed.len() >= count {
                break;
            }
            if board.get(cell) == CellState::Empty {
                board.set(cell, CellState::Blocked);
                placed.push(cell);
            }
        }
    }

    placed
}

fn place_blockers_chaotic(
    board: &mut Board,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Coord>> {
    let mut placed = Vec::with_capacity(count);
    let mut attempts_left = SCATTER_ATTEMPT_FACTOR * count;

    while placed.len() < count && attempts_left > 0 {
        attempts_left -= 1;
        let cell = (
            rng.gen_range(0..board.rows() as i32),
            rng.gen_range(0..board.cols() as i32),
        );
        if board.get(cell) == CellState::Empty {
            board.set(cell, CellState::Blocked);
            placed.push(cell);
        }
    }
    if placed.len() < count {
        return Err(Error::NoPlacement);
    }
    Ok(placed)
}

/// Places each color's locks on single random empty cells.
///
/// The four-way mirror only ever applies to blockers, so both strategies
/// share this path, capped at ten attempts per lock.
fn place_locks(
    board: &mut Board,
    lock_counts: &[usize],
    rng: &mut impl Rng,
) -> Result<Vec<Vec<Coord>>> {
    let mut locks = Vec::with_capacity(lock_counts.len());

    for (color_index, &count) in lock_counts.iter().enumerate() {
        let mut placed = Vec::with_capacity(count);
        let mut attempts_left = SCATTER_ATTEMPT_FACTOR * count;
        while placed.len() < count && attempts_left > 0 {
            attempts_left -= 1;
            let cell = (
                rng.gen_range(0..board.rows() as i32),
                rng.gen_range(0..board.cols() as i32),
            );
            if board.get(cell) == CellState::Empty {
                board.set(cell, CellState::Locked(Color(color_index)));
                placed.push(cell);
            }
        }
        if placed.len() < count {
            return Err(Error::NoPlacement);
        }
        locks.push(placed);
    }

    Ok(locks)
}

/// Places every selected shape on random all-empty anchors, color by color.
fn place_shapes(
    board: &mut Board,
    library: &ShapeLibrary,
    picks: &[Vec<ShapePick>],
    rng: &mut impl Rng,
) -> Result<Vec<Vec<Placement>>> {
    let shapes = library.shapes();
    let mut all = Vec::with_capacity(picks.len());

    for (color_index, list) in picks.iter().enumerate() {
        let color = Color(color_index);
        let mut placements = Vec::with_capacity(list.len());
        for pick in list {
            let shape = &shapes[pick.shape];
            let rotation = &shape.rotations[pick.rotation];
            if rotation.height > board.rows() || rotation.width > board.cols() {
                return Err(Error::NoPlacement);
            }

            let mut anchors = Vec::new();
            for anchor_row in 0..=(board.rows() - rotation.height) as i32 {
                for anchor_col in 0..=(board.cols() - rotation.width) as i32 {
                    let all_empty = rotation.cells.iter().all(|&(row, col)| {
                        board.get((anchor_row + row, anchor_col + col)) == CellState::Empty
                    });
                    if all_empty {
                        anchors.push((anchor_row, anchor_col));
                    }
                }
            }
            let Some(&anchor) = anchors.choose(rng) else {
                return Err(Error::NoPlacement);
            };

            let cells: Vec<Coord> = rotation
                .cells
                .iter()
                .map(|&(row, col)| (anchor.0 + row, anchor.1 + col))
                .collect();
            for &cell in &cells {
                board.set(cell, CellState::Filled(color));
            }
            placements.push(Placement {
                shape: shape.id.clone(),
                rotation: pick.rotation,
                anchor,
                cells,
            });
        }
        all.push(placements);
    }

    Ok(all)
}

/// Fallback tail: assigns shuffled empty cells as blockers, then as locks.
fn scatter_blockers_and_locks(
    board: &mut Board,
    blocker_budget: usize,
    lock_counts: &[usize],
    rng: &mut impl Rng,
) -> (Vec<Coord>, Vec<Vec<Coord>>) {
    let mut empties = board.empty_cells();
    empties.shuffle(rng);

    let needed = blocker_budget + lock_counts.iter().sum::<usize>();
    if empties.len() < needed {
        // best effort, no reselection
        warn!(
            "{} empty cells left for {needed} blockers and locks",
            empties.len()
        );
    }

    let mut supply = empties.into_iter();
    let blockers: Vec<Coord> = supply.by_ref().take(blocker_budget).collect();
    for &cell in &blockers {
        board.set(cell, CellState::Blocked);
    }

    let mut locks = Vec::with_capacity(lock_counts.len());
    for (color_index, &count) in lock_counts.iter().enumerate() {
        let placed: Vec<Coord> = supply.by_ref().take(count).collect();
        for &cell in &placed {
            board.set(cell, CellState::Locked(Color(color_index)));
        }
        locks.push(placed);
    }

    (blockers, locks)
}

/// Phase 7: derives the requirements and packages the puzzle.
fn finalize(
    board: Board,
    config: &GeneratorConfig,
    placements: Vec<Vec<Placement>>,
    blockers: Vec<Coord>,
    locks: Vec<Vec<Coord>>,
) -> Puzzle {
    let requirements = Requirements::from_board(&board, config.colors.len());

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

    Puzzle {
        board,
        colors: config.colors.clone(),
        placements,
        blockers,
        locks,
        requirements,
        solution,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::solver;

    fn count_multisets(puzzle: &Puzzle) -> Vec<Vec<(String, usize)>> {
        puzzle
            .placements
            .iter()
            .map(|color_placements| {
                let mut counts: Vec<(String, usize)> = Vec::new();
                for placement in color_placements {
                    if let Some(entry) = counts.iter_mut().find(|(id, _)| *id == placement.shape) {
                        entry.1 += 1;
                    } else {
                        counts.push((placement.shape.clone(), 1));
                    }
                }
                counts
            })
            .collect()
    }

    fn assert_internally_consistent(puzzle: &Puzzle) {
        let colors = puzzle.colors.len();
        assert_eq!(
            puzzle.requirements,
            Requirements::from_board(&puzzle.board, colors)
        );

        // solution, blockers and locks are pairwise disjoint
        let mut seen = Vec::new();
        for cells in puzzle.solution.iter().chain(std::iter::once(&puzzle.blockers)) {
            for &cell in cells {
                assert!(!seen.contains(&cell), "cell {cell:?} claimed twice");
                seen.push(cell);
            }
        }
        assert!(seen.len() <= puzzle.board.len());

        // the witness matches the derived requirements
        let solution = crate::puzzle::Solution {
            placements: puzzle.placements.clone(),
            cells: puzzle.solution.clone(),
        };
        assert!(solver::validate(&puzzle.board, &solution, &puzzle.requirements).is_clean());
    }

    #[test]
    fn square_fills_a_two_by_two_grid() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig {
            rows: 2,
            cols: 2,
            colors: vec!["green".to_string()],
            blockers: false,
            locks: false,
            shape_pool: vec!["square-4".to_string()],
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let puzzle = generate_with_rng(&library, &config, &mut rng).unwrap();

        assert_eq!(puzzle.requirements.rows, vec![vec![2], vec![2]]);
        assert_eq!(puzzle.requirements.cols, vec![vec![2], vec![2]]);
        assert!(puzzle.blockers.is_empty());
        assert_internally_consistent(&puzzle);

        let solutions =
            solver::solve_counts(&library, &Board::new(2, 2), &puzzle.requirements, &["square-4"])
                .unwrap();
        assert_eq!(solutions.len(), 1);

        // round trip: the exact multiset recovers exactly the witness
        let exact = solver::solve_exact_counts(
            &library,
            &Board::new(2, 2),
            &puzzle.requirements,
            &count_multisets(&puzzle),
        )
        .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].cells, puzzle.solution);
    }

    #[test]
    fn triple_line_on_three_by_three_fills_the_reserve_with_blockers() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig {
            rows: 3,
            cols: 3,
            colors: vec!["green".to_string()],
            blockers: true,
            locks: false,
            shape_pool: vec!["line-3".to_string()],
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let puzzle = generate_with_rng(&library, &config, &mut rng).unwrap();

        // reserve floor(6 / 1.5) = 4, budget 5, one line-3 fits, remainder 2
        assert_eq!(puzzle.blockers.len(), 6);
        assert_eq!(puzzle.placements[0].len(), 1);
        assert_internally_consistent(&puzzle);

        // round trip: only three cells are open, so the witness is the sole
        // exact-count solution
        let mut solve_board = Board::new(3, 3);
        for &cell in &puzzle.blockers {
            solve_board.set(cell, CellState::Blocked);
        }
        let solutions = solver::solve_exact_counts(
            &library,
            &solve_board,
            &puzzle.requirements,
            &count_multisets(&puzzle),
        )
        .unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].cells, puzzle.solution);
    }

    #[test]
    fn default_two_color_puzzle_round_trips_through_the_solver() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let puzzle = generate_with_rng(&library, &config, &mut rng).unwrap();

        assert_eq!(puzzle.colors.len(), 2);
        assert!(puzzle.locks.iter().all(Vec::is_empty));
        assert!(puzzle.blockers.len() >= 2 * (5 + 5) / 3);
        assert_internally_consistent(&puzzle);

        // a solve grid carries the blockers and locks but hides the fill
        let mut solve_board = Board::new(5, 5);
        for &cell in &puzzle.blockers {
            solve_board.set(cell, CellState::Blocked);
        }
        for (color_index, color_locks) in puzzle.locks.iter().enumerate() {
            for &cell in color_locks {
                solve_board.set(cell, CellState::Locked(Color(color_index)));
            }
        }

        let solutions = solver::solve_exact_counts(
            &library,
            &solve_board,
            &puzzle.requirements,
            &count_multisets(&puzzle),
        )
        .unwrap();
        assert!(!solutions.is_empty());
        assert!(solutions.len() <= solver::MAX_PUZZLE_SOLUTIONS);
        for solution in &solutions {
            assert!(solver::validate(&solve_board, solution, &puzzle.requirements).is_clean());
        }
    }

    #[test]
    fn locks_are_distributed_across_colors() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig {
            locks: true,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let puzzle = generate_with_rng(&library, &config, &mut rng).unwrap();

        let lock_total: usize = puzzle.locks.iter().map(Vec::len).sum();
        assert!(lock_total > 0);
        assert!(puzzle.blockers.len() + lock_total >= 2 * (5 + 5) / 3);
        assert_internally_consistent(&puzzle);
    }

    #[test]
    fn impossible_pool_times_out() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig {
            rows: 2,
            cols: 2,
            colors: vec!["green".to_string()],
            blockers: false,
            locks: false,
            shape_pool: vec!["cross-5".to_string()],
            time_budget: Duration::from_millis(20),
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_with_rng(&library, &config, &mut rng),
            Err(Error::DeadlineExceeded)
        ));
    }

    #[test]
    fn unknown_pool_entries_are_rejected_up_front() {
        let library = ShapeLibrary::standard();
        let config = GeneratorConfig {
            shape_pool: vec!["heptomino-7".to_string()],
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_with_rng(&library, &config, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }
}
