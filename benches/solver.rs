//! Benchmarks for the polyomino puzzle engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use polycount::generator::{self, GeneratorConfig};
use polycount::geometry::unique_rotations;
use polycount::grid::{Board, CellState};
use polycount::shapes::ShapeLibrary;
use polycount::solver;

/// Benchmark generating a default 5x5 two-color puzzle.
fn bench_generate(c: &mut Criterion) {
    let library = ShapeLibrary::standard();
    let config = GeneratorConfig::default();

    c.bench_function("generate_5x5", |b| {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        b.iter(|| generator::generate_with_rng(&library, black_box(&config), &mut rng))
    });
}

/// Benchmark recovering solutions for a fixed generated puzzle.
fn bench_solve_counts(c: &mut Criterion) {
    let library = ShapeLibrary::standard();
    let config = GeneratorConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let puzzle = generator::generate_with_rng(&library, &config, &mut rng)
        .expect("seeded generation succeeds");

    let mut board = Board::new(puzzle.board.rows(), puzzle.board.cols());
    for &cell in &puzzle.blockers {
        board.set(cell, CellState::Blocked);
    }
    let enabled: Vec<&str> = library.ids().collect();

    c.bench_function("solve_counts_5x5", |b| {
        b.iter(|| solver::solve_counts(&library, black_box(&board), &puzzle.requirements, &enabled))
    });
}

/// Benchmark computing the unique rotations of a single shape.
fn bench_rotations(c: &mut Criterion) {
    let ell = [(0, 0), (1, 0), (2, 0), (2, 1)];

    c.bench_function("unique_rotations", |b| {
        b.iter(|| unique_rotations(black_box(&ell)))
    });
}

criterion_group!(benches, bench_generate, bench_solve_counts, bench_rotations);
criterion_main!(benches);
