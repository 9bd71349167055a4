//! Color-Counted Polyomino Puzzle CLI
//!
//! Generates puzzles where polyomino placements must match per-row and
//! per-column color counts, saves them to disk and recovers solutions with
//! the backtracking solver.

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use polycount::generator::{self, GeneratorConfig};
use polycount::grid::{self, Board, CellState, Color};
use polycount::persistence;
use polycount::puzzle::{format_puzzle, Puzzle};
use polycount::shapes::ShapeLibrary;
use polycount::solver;

/// Generates and solves color-counted polyomino puzzles.
#[derive(Parser)]
#[command(name = "polycount")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a puzzle and save it to disk.
    Generate(GenerateArgs),
    /// Solve the saved puzzle from its row/column requirements.
    Solve,
    /// Display the saved puzzle.
    Show,
}

#[derive(Args)]
struct GenerateArgs {
    /// Grid height.
    #[arg(long, default_value_t = 5)]
    rows: usize,
    /// Grid width.
    #[arg(long, default_value_t = 5)]
    cols: usize,
    /// Palette color name, repeat to add colors.
    #[arg(long = "color")]
    colors: Vec<String>,
    /// Leave out blocked cells.
    #[arg(long)]
    no_blockers: bool,
    /// Add color-locked given cells.
    #[arg(long)]
    locks: bool,
    /// Shape id to draw from, repeat to restrict the pool.
    #[arg(long = "shape")]
    shapes: Vec<String>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

impl GenerateArgs {
    fn to_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig {
            rows: self.rows,
            cols: self.cols,
            blockers: !self.no_blockers,
            locks: self.locks,
            shape_pool: self.shapes.clone(),
            ..GeneratorConfig::default()
        };
        if !self.colors.is_empty() {
            config.colors = self.colors.clone();
        }
        config
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Generate(args)) => run_generate(&args.to_config(), args.seed),
        Some(Command::Solve) => run_solve(),
        Some(Command::Show) => run_show(),
        None => run_generate(&GeneratorConfig::default(), None),
    }
}

/// Generates a puzzle, saves it and prints it.
fn run_generate(config: &GeneratorConfig, seed: Option<u64>) {
    let library = ShapeLibrary::standard();
    let result = match seed {
        Some(seed) => generator::generate_with_rng(&library, config, &mut StdRng::seed_from_u64(seed)),
        None => generator::generate(&library, config),
    };

    match result {
        Ok(puzzle) => {
            if let Err(e) = persistence::save(&puzzle) {
                eprintln!("Failed to save puzzle: {}", e);
            } else {
                println!("Wrote puzzle.txt and puzzle.bin");
            }
            print!("{}", format_puzzle(&puzzle));
        }
        Err(e) => eprintln!("Generation failed: {}", e),
    }
}

/// Loads the saved puzzle and recovers solutions from its requirements.
fn run_solve() {
    let Some(puzzle) = persistence::load() else {
        eprintln!("No puzzle.bin found. Run 'polycount generate' first.");
        return;
    };

    let library = ShapeLibrary::standard();
    let enabled: Vec<&str> = library.ids().collect();
    let board = solve_board(&puzzle);

    match solver::solve_counts(&library, &board, &puzzle.requirements, &enabled) {
        Ok(solutions) => {
            println!("Found {} solutions, showing the first:", solutions.len());
            print!("{}", render_solution(&puzzle, &solutions[0]));
        }
        Err(e) => eprintln!("Solve failed: {}", e),
    }
}

/// Loads and displays the saved puzzle.
fn run_show() {
    match persistence::load() {
        Some(puzzle) => print!("{}", format_puzzle(&puzzle)),
        None => eprintln!("No puzzle.bin found. Run 'polycount generate' first."),
    }
}

/// The grid a solver sees: blockers and locks kept, fill hidden.
fn solve_board(puzzle: &Puzzle) -> Board {
    let mut board = Board::new(puzzle.board.rows(), puzzle.board.cols());
    for &cell in &puzzle.blockers {
        board.set(cell, CellState::Blocked);
    }
    for (color_index, color_locks) in puzzle.locks.iter().enumerate() {
        for &cell in color_locks {
            board.set(cell, CellState::Locked(Color(color_index)));
        }
    }
    board
}

/// Renders a recovered solution on the puzzle's grid.
fn render_solution(puzzle: &Puzzle, solution: &polycount::puzzle::Solution) -> String {
    let mut board = solve_board(puzzle);
    for (color_index, cells) in solution.cells.iter().enumerate() {
        for &cell in cells {
            if board.get(cell) == CellState::Empty {
                board.set(cell, CellState::Filled(Color(color_index)));
            }
        }
    }
    grid::format_board(&board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_declaration_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
