//! Count-constrained backtracking solver.
//!
//! Key mechanics:
//! - Bitmask for occupied cells (u32, u64 or [u64; 4] selected by grid size)
//! - Pre-computed placement bitmasks and row/column histograms, so pushing a
//!   placement is three updates and popping is their inverse
//! - Recursive search over a deterministically ordered candidate list with a
//!   start index, so no placement multiset is visited twice
//! - Colors solved sequentially, each color's cells forbidden to the next

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::geometry::Coord;
use crate::grid::{Board, CellState, Color};
use crate::puzzle::{Placement, Requirements, Solution, ValidationReport};
use crate::shapes::ShapeLibrary;

/// Most solutions any single per-color search may produce.
pub const MAX_COLOR_SOLUTIONS: usize = 100;

/// Most whole-puzzle solutions any solve may produce.
pub const MAX_PUZZLE_SOLUTIONS: usize = 50;

/// Largest supported grid, in cells.
pub const MAX_GRID_CELLS: usize = 256;

/// Trait for bitmask types used to track occupied grid cells.
///
/// Implemented for `u32` (grids up to 32 cells), `u64` (up to 64) and
/// [`WideMask`] (up to 256).
trait CellMask:
    Copy
    + Eq
    + std::ops::BitAnd<Output = Self>
    + std::ops::BitOr<Output = Self>
    + std::ops::BitXor<Output = Self>
{
    fn zero() -> Self;
    fn bit(index: usize) -> Self;
    fn is_nonzero(self) -> bool;
}

impl CellMask for u32 {
    #[inline(always)]
    fn zero() -> Self {
        0
    }
    #[inline(always)]
    fn bit(index: usize) -> Self {
        1u32 << index
    }
    #[inline(always)]
    fn is_nonzero(self) -> bool {
        self != 0
    }
}

impl CellMask for u64 {
    #[inline(always)]
    fn zero() -> Self {
        0
    }
    #[inline(always)]
    fn bit(index: usize) -> Self {
        1u64 << index
    }
    #[inline(always)]
    fn is_nonzero(self) -> bool {
        self != 0
    }
}

/// Bitmask for grids of up to 256 cells.
#[derive(Clone, Copy, PartialEq, Eq)]
struct WideMask([u64; 4]);

impl std::ops::BitAnd for WideMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        let mut words = self.0;
        for (word, other) in words.iter_mut().zip(rhs.0) {
            *word &= other;
        }
        Self(words)
    }
}

impl std::ops::BitOr for WideMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        let mut words = self.0;
        for (word, other) in words.iter_mut().zip(rhs.0) {
            *word |= other;
        }
        Self(words)
    }
}

impl std::ops::BitXor for WideMask {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        let mut words = self.0;
        for (word, other) in words.iter_mut().zip(rhs.0) {
            *word ^= other;
        }
        Self(words)
    }
}

impl CellMask for WideMask {
    #[inline(always)]
    fn zero() -> Self {
        Self([0; 4])
    }
    #[inline(always)]
    fn bit(index: usize) -> Self {
        let mut words = [0u64; 4];
        words[index / 64] = 1u64 << (index % 64);
        Self(words)
    }
    #[inline(always)]
    fn is_nonzero(self) -> bool {
        self.0.iter().any(|&word| word != 0)
    }
}

/// Mask width selected from the grid's cell count.
enum MaskWidth {
    U32,
    U64,
    Wide,
}

fn mask_width(cells: usize) -> Result<MaskWidth> {
    if cells == 0 {
        Err(Error::InvalidConfig("grid has no cells".to_string()))
    } else if cells <= 32 {
        Ok(MaskWidth::U32)
    } else if cells <= 64 {
        Ok(MaskWidth::U64)
    } else if cells <= MAX_GRID_CELLS {
        Ok(MaskWidth::Wide)
    } else {
        Err(Error::InvalidConfig(format!(
            "grid of {cells} cells exceeds the {MAX_GRID_CELLS}-cell limit"
        )))
    }
}

/// Pre-computed pre-valid placement of one shape rotation at one anchor.
struct Candidate<M> {
    shape_index: usize,
    rotation: usize,
    anchor: Coord,
    /// Absolute cells, sorted row-major.
    cells: Vec<Coord>,
    mask: M,
    /// (row, cells in that row) for every touched row.
    row_hist: Vec<(usize, u32)>,
    col_hist: Vec<(usize, u32)>,
    /// Linear index of the minimum cell, the deterministic sort key.
    min_pos: usize,
}

/// Blockers and locks of the input board in mask form.
///
/// Locked cells are pre-filled givens: they seed their color's running
/// counts and are forbidden to every placement. Filled cells in a solve
/// input are the hidden answer, so they read as empty here.
struct BoardContext<M> {
    blocked: M,
    locked_all: M,
    lock_rows: Vec<Vec<u32>>,
    lock_cols: Vec<Vec<u32>>,
    lock_cells: Vec<Vec<Coord>>,
}

impl<M: CellMask> BoardContext<M> {
    fn new(board: &Board, num_colors: usize) -> Result<Self> {
        let mut ctx = Self {
            blocked: M::zero(),
            locked_all: M::zero(),
            lock_rows: vec![vec![0; board.rows()]; num_colors],
            lock_cols: vec![vec![0; board.cols()]; num_colors],
            lock_cells: vec![Vec::new(); num_colors],
        };
        for (cell, state) in board.iter() {
            match state {
                CellState::Blocked => {
                    ctx.blocked = ctx.blocked | M::bit(board.cell_index(cell));
                }
                CellState::Locked(Color(color)) => {
                    if color >= num_colors {
                        return Err(Error::InvalidConfig(format!(
                            "locked cell {cell:?} uses color {color} outside the palette of {num_colors}"
                        )));
                    }
                    ctx.locked_all = ctx.locked_all | M::bit(board.cell_index(cell));
                    ctx.lock_rows[color][cell.0 as usize] += 1;
                    ctx.lock_cols[color][cell.1 as usize] += 1;
                    ctx.lock_cells[color].push(cell);
                }
                CellState::Filled(_) | CellState::Empty => {}
            }
        }
        Ok(ctx)
    }
}

/// Enumerates every pre-valid placement of the given shapes.
///
/// An anchor is pre-valid when the whole rotation stays in bounds and no
/// absolute cell lands on a blocked cell.
fn enumerate_candidates<M: CellMask>(
    library: &ShapeLibrary,
    shape_indices: &[usize],
    rows: usize,
    cols: usize,
    blocked: M,
) -> Vec<Candidate<M>> {
    let shapes = library.shapes();
    let mut candidates = Vec::new();

    for &shape_index in shape_indices {
        for (rotation_index, rotation) in shapes[shape_index].rotations.iter().enumerate() {
            if rotation.height > rows || rotation.width > cols {
                continue;
            }
            for anchor_row in 0..=(rows - rotation.height) as i32 {
                for anchor_col in 0..=(cols - rotation.width) as i32 {
                    let cells: Vec<Coord> = rotation
                        .cells
                        .iter()
                        .map(|&(row, col)| (anchor_row + row, anchor_col + col))
                        .collect();

                    let mut mask = M::zero();
                    let mut row_hist: Vec<(usize, u32)> = Vec::new();
                    let mut col_hist: Vec<(usize, u32)> = Vec::new();
                    for &(row, col) in &cells {
                        mask = mask | M::bit(row as usize * cols + col as usize);
                        bump(&mut row_hist, row as usize);
                        bump(&mut col_hist, col as usize);
                    }
                    if (mask & blocked).is_nonzero() {
                        continue;
                    }

                    // cells are sorted, so the first one is the minimum
                    let min_pos = cells[0].0 as usize * cols + cells[0].1 as usize;
                    candidates.push(Candidate {
                        shape_index,
                        rotation: rotation_index,
                        anchor: (anchor_row, anchor_col),
                        cells,
                        mask,
                        row_hist,
                        col_hist,
                        min_pos,
                    });
                }
            }
        }
    }

    candidates
}

fn bump(hist: &mut Vec<(usize, u32)>, key: usize) {
    if let Some(entry) = hist.iter_mut().find(|(k, _)| *k == key) {
        entry.1 += 1;
    } else {
        hist.push((key, 1));
    }
}

/// Snapshot of one per-color outcome: candidate indices plus occupied mask.
struct ColorSnap<M> {
    placements: Vec<usize>,
    used: M,
}

/// Backtracking search for a single color.
struct ColorSearch<'a, M: CellMask> {
    candidates: &'a [Candidate<M>],
    row_req: &'a [u32],
    col_req: &'a [u32],
    /// Running counts, seeded with the color's locked cells.
    rows: Vec<u32>,
    cols: Vec<u32>,
    used: M,
    forbidden: M,
    stack: Vec<usize>,
    /// Per-shape uses left, present only in exact-count mode.
    remaining: Option<Vec<usize>>,
    solutions: Vec<ColorSnap<M>>,
    cap: usize,
}

impl<M: CellMask> ColorSearch<'_, M> {
    fn run(&mut self, start: usize) {
        if self.solutions.len() >= self.cap {
            return;
        }
        if self.over_requirement() {
            return;
        }
        if self.satisfied() {
            // keep searching after a hit, supersets are pruned above
            self.solutions.push(ColorSnap {
                placements: self.stack.clone(),
                used: self.used,
            });
            if self.solutions.len() >= self.cap {
                return;
            }
        }

        let candidates = self.candidates;
        for index in start..candidates.len() {
            let candidate = &candidates[index];
            if let Some(remaining) = &self.remaining {
                if remaining[candidate.shape_index] == 0 {
                    continue;
                }
            }
            if ((self.used | self.forbidden) & candidate.mask).is_nonzero() {
                continue;
            }
            self.push(index);
            self.run(index + 1);
            self.pop(index);
            if self.solutions.len() >= self.cap {
                return;
            }
        }
    }

    fn push(&mut self, index: usize) {
        let candidates = self.candidates;
        let candidate = &candidates[index];
        self.used = self.used | candidate.mask;
        for &(row, count) in &candidate.row_hist {
            self.rows[row] += count;
        }
        for &(col, count) in &candidate.col_hist {
            self.cols[col] += count;
        }
        if let Some(remaining) = &mut self.remaining {
            remaining[candidate.shape_index] -= 1;
        }
        self.stack.push(index);
    }

    fn pop(&mut self, index: usize) {
        let candidates = self.candidates;
        let candidate = &candidates[index];
        self.used = self.used ^ candidate.mask;
        for &(row, count) in &candidate.row_hist {
            self.rows[row] -= count;
        }
        for &(col, count) in &candidate.col_hist {
            self.cols[col] -= count;
        }
        if let Some(remaining) = &mut self.remaining {
            remaining[candidate.shape_index] += 1;
        }
        self.stack.pop();
    }

    fn satisfied(&self) -> bool {
        self.rows.as_slice() == self.row_req && self.cols.as_slice() == self.col_req
    }

    fn over_requirement(&self) -> bool {
        let over = |counts: &[u32], required: &[u32]| {
            counts
                .iter()
                .zip(required)
                .any(|(&count, &limit)| count > limit)
        };
        over(&self.rows, self.row_req) || over(&self.cols, self.col_req)
    }
}

/// Sequential per-color composition of whole-puzzle solutions.
struct Composer<'a, M: CellMask> {
    library: &'a ShapeLibrary,
    candidates: &'a [Candidate<M>],
    ctx: &'a BoardContext<M>,
    requirements: &'a Requirements,
    /// Per-color per-shape instance counts, present only in exact-count mode.
    remaining: Option<&'a [Vec<usize>]>,
    solutions: Vec<Solution>,
}

impl<M: CellMask> Composer<'_, M> {
    fn compose(&mut self, color: usize, forbidden: M, partial: &mut Vec<ColorSnap<M>>) {
        if self.solutions.len() >= MAX_PUZZLE_SOLUTIONS {
            return;
        }
        if color == self.requirements.num_colors() {
            let solution = self.assemble(partial);
            self.solutions.push(solution);
            return;
        }

        let row_req: Vec<u32> = self.requirements.rows.iter().map(|c| c[color]).collect();
        let col_req: Vec<u32> = self.requirements.cols.iter().map(|c| c[color]).collect();
        if row_req.iter().all(|&n| n == 0) && col_req.iter().all(|&n| n == 0) {
            // nothing required of this color, one vacuous outcome
            partial.push(ColorSnap {
                placements: Vec::new(),
                used: M::zero(),
            });
            self.compose(color + 1, forbidden, partial);
            partial.pop();
            return;
        }

        let mut search = ColorSearch {
            candidates: self.candidates,
            row_req: &row_req,
            col_req: &col_req,
            rows: self.ctx.lock_rows[color].clone(),
            cols: self.ctx.lock_cols[color].clone(),
            used: M::zero(),
            forbidden,
            stack: Vec::new(),
            remaining: self.remaining.map(|counts| counts[color].clone()),
            solutions: Vec::new(),
            cap: MAX_COLOR_SOLUTIONS,
        };
        search.run(0);
        debug!("color {color}: {} per-color solutions", search.solutions.len());

        for snap in search.solutions {
            let used = snap.used;
            partial.push(snap);
            self.compose(color + 1, forbidden | used, partial);
            partial.pop();
            if self.solutions.len() >= MAX_PUZZLE_SOLUTIONS {
                return;
            }
        }
    }

    fn assemble(&self, partial: &[ColorSnap<M>]) -> Solution {
        let shapes = self.library.shapes();
        let mut placements = Vec::with_capacity(partial.len());
        let mut cells = Vec::with_capacity(partial.len());

        for (color, snap) in partial.iter().enumerate() {
            let mut color_placements = Vec::with_capacity(snap.placements.len());
            let mut color_cells = self.ctx.lock_cells[color].clone();
            for &index in &snap.placements {
                let candidate = &self.candidates[index];
                color_cells.extend_from_slice(&candidate.cells);
                color_placements.push(Placement {
                    shape: shapes[candidate.shape_index].id.clone(),
                    rotation: candidate.rotation,
                    anchor: candidate.anchor,
                    cells: candidate.cells.clone(),
                });
            }
            color_cells.sort_unstable();
            placements.push(color_placements);
            cells.push(color_cells);
        }

        Solution { placements, cells }
    }
}

fn check_dimensions(board: &Board, requirements: &Requirements) -> Result<()> {
    let num_colors = requirements.num_colors();
    if num_colors == 0 {
        return Err(Error::InvalidConfig(
            "requirements name no colors".to_string(),
        ));
    }
    if requirements.rows.len() != board.rows() || requirements.cols.len() != board.cols() {
        return Err(Error::InvalidConfig(format!(
            "requirements cover {}x{} but the grid is {}x{}",
            requirements.rows.len(),
            requirements.cols.len(),
            board.rows(),
            board.cols()
        )));
    }
    if requirements
        .rows
        .iter()
        .chain(requirements.cols.iter())
        .any(|counts| counts.len() != num_colors)
    {
        return Err(Error::InvalidConfig(
            "per-color requirement counts have inconsistent lengths".to_string(),
        ));
    }
    Ok(())
}

/// Resolves shape ids to library indices, preserving first-appearance order.
fn resolve_shape_ids(library: &ShapeLibrary, ids: &[&str]) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(ids.len());
    for id in ids {
        let index = library
            .index_of(id)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown shape id {id:?}")))?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    Ok(indices)
}

/// Finds solutions using any number of shapes of each enabled type.
pub fn solve_counts(
    library: &ShapeLibrary,
    board: &Board,
    requirements: &Requirements,
    enabled_shapes: &[&str],
) -> Result<Vec<Solution>> {
    match mask_width(board.len())? {
        MaskWidth::U32 => solve_counts_with_mask::<u32>(library, board, requirements, enabled_shapes),
        MaskWidth::U64 => solve_counts_with_mask::<u64>(library, board, requirements, enabled_shapes),
        MaskWidth::Wide => {
            solve_counts_with_mask::<WideMask>(library, board, requirements, enabled_shapes)
        }
    }
}

fn solve_counts_with_mask<M: CellMask>(
    library: &ShapeLibrary,
    board: &Board,
    requirements: &Requirements,
    enabled_shapes: &[&str],
) -> Result<Vec<Solution>> {
    check_dimensions(board, requirements)?;
    if requirements.is_all_zero() {
        return Err(Error::NoRequirements);
    }
    let shape_indices = resolve_shape_ids(library, enabled_shapes)?;
    let ctx = BoardContext::<M>::new(board, requirements.num_colors())?;

    let mut candidates =
        enumerate_candidates(library, &shape_indices, board.rows(), board.cols(), ctx.blocked);
    if candidates.is_empty() {
        return Err(Error::NoPlacement);
    }
    candidates.sort_by_key(|candidate| candidate.min_pos);
    debug!("{} pre-valid placements", candidates.len());

    compose_solutions(library, &candidates, &ctx, requirements, None)
}

/// Finds solutions using each supplied shape instance at most once.
///
/// `shape_counts` holds one `(shape id, count)` multiset per color, in
/// palette order.
pub fn solve_exact_counts(
    library: &ShapeLibrary,
    board: &Board,
    requirements: &Requirements,
    shape_counts: &[Vec<(String, usize)>],
) -> Result<Vec<Solution>> {
    match mask_width(board.len())? {
        MaskWidth::U32 => {
            solve_exact_counts_with_mask::<u32>(library, board, requirements, shape_counts)
        }
        MaskWidth::U64 => {
            solve_exact_counts_with_mask::<u64>(library, board, requirements, shape_counts)
        }
        MaskWidth::Wide => {
            solve_exact_counts_with_mask::<WideMask>(library, board, requirements, shape_counts)
        }
    }
}

fn solve_exact_counts_with_mask<M: CellMask>(
    library: &ShapeLibrary,
    board: &Board,
    requirements: &Requirements,
    shape_counts: &[Vec<(String, usize)>],
) -> Result<Vec<Solution>> {
    check_dimensions(board, requirements)?;
    if requirements.is_all_zero() {
        return Err(Error::NoRequirements);
    }
    if shape_counts.len() != requirements.num_colors() {
        return Err(Error::InvalidConfig(format!(
            "shape counts cover {} colors but the requirements name {}",
            shape_counts.len(),
            requirements.num_colors()
        )));
    }

    let mut remaining = vec![vec![0usize; library.shapes().len()]; shape_counts.len()];
    let mut shape_indices: Vec<usize> = Vec::new();
    for (color, counts) in shape_counts.iter().enumerate() {
        for (id, count) in counts {
            if *count == 0 {
                continue;
            }
            let index = library
                .index_of(id)
                .ok_or_else(|| Error::InvalidConfig(format!("unknown shape id {id:?}")))?;
            if !shape_indices.contains(&index) {
                shape_indices.push(index);
            }
            remaining[color][index] += count;
        }
    }

    let ctx = BoardContext::<M>::new(board, requirements.num_colors())?;
    let mut candidates =
        enumerate_candidates(library, &shape_indices, board.rows(), board.cols(), ctx.blocked);
    if candidates.is_empty() {
        return Err(Error::NoPlacement);
    }
    candidates.sort_by_key(|candidate| candidate.min_pos);

    compose_solutions(library, &candidates, &ctx, requirements, Some(&remaining))
}

fn compose_solutions<M: CellMask>(
    library: &ShapeLibrary,
    candidates: &[Candidate<M>],
    ctx: &BoardContext<M>,
    requirements: &Requirements,
    remaining: Option<&[Vec<usize>]>,
) -> Result<Vec<Solution>> {
    let mut composer = Composer {
        library,
        candidates,
        ctx,
        requirements,
        remaining,
        solutions: Vec::new(),
    };
    composer.compose(0, ctx.blocked | ctx.locked_all, &mut Vec::new());
    if composer.solutions.is_empty() {
        return Err(Error::NoSolution);
    }
    Ok(composer.solutions)
}

/// Backtracking search consuming every instance of a fixed multiset.
struct FitSearch<'a, M: CellMask> {
    candidates: &'a [Candidate<M>],
    /// Candidate indices per library shape index.
    per_shape: Vec<Vec<usize>>,
    instances: &'a [usize],
    used: M,
    stack: Vec<usize>,
    solutions: Vec<Vec<usize>>,
}

impl<M: CellMask> FitSearch<'_, M> {
    /// Returns true when the search should stop.
    fn run(&mut self, instance: usize) -> bool {
        if instance == self.instances.len() {
            self.solutions.push(self.stack.clone());
            // first complete fit ends the search
            return true;
        }
        let shape = self.instances[instance];
        for i in 0..self.per_shape[shape].len() {
            let index = self.per_shape[shape][i];
            let mask = self.candidates[index].mask;
            if (self.used & mask).is_nonzero() {
                continue;
            }
            self.used = self.used | mask;
            self.stack.push(index);
            let stop = self.run(instance + 1);
            self.stack.pop();
            self.used = self.used ^ mask;
            if stop {
                return true;
            }
        }
        false
    }
}

/// Finds placements that consume every instance of the multiset with no
/// overlaps, ignoring requirements.
///
/// Instances are tried in the order given; for each instance all pre-valid
/// placements of its shape are tried. Returns on the first success.
pub fn fit_all_pieces(
    library: &ShapeLibrary,
    rows: usize,
    cols: usize,
    blocked: &[Coord],
    shape_counts: &[(String, usize)],
) -> Result<Vec<Vec<Placement>>> {
    match mask_width(rows * cols)? {
        MaskWidth::U32 => fit_all_with_mask::<u32>(library, rows, cols, blocked, shape_counts),
        MaskWidth::U64 => fit_all_with_mask::<u64>(library, rows, cols, blocked, shape_counts),
        MaskWidth::Wide => fit_all_with_mask::<WideMask>(library, rows, cols, blocked, shape_counts),
    }
}

fn fit_all_with_mask<M: CellMask>(
    library: &ShapeLibrary,
    rows: usize,
    cols: usize,
    blocked_cells: &[Coord],
    shape_counts: &[(String, usize)],
) -> Result<Vec<Vec<Placement>>> {
    let mut blocked = M::zero();
    for &(row, col) in blocked_cells {
        if !(0..rows as i32).contains(&row) || !(0..cols as i32).contains(&col) {
            return Err(Error::InvalidConfig(format!(
                "blocked cell ({row}, {col}) is outside the {rows}x{cols} grid"
            )));
        }
        blocked = blocked | M::bit(row as usize * cols + col as usize);
    }

    let mut instances: Vec<usize> = Vec::new();
    for (id, count) in shape_counts {
        let index = library
            .index_of(id)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown shape id {id:?}")))?;
        instances.extend(std::iter::repeat(index).take(*count));
    }
    if instances.is_empty() {
        return Err(Error::InvalidConfig("no shape instances to fit".to_string()));
    }

    let mut shape_indices = instances.clone();
    shape_indices.sort_unstable();
    shape_indices.dedup();
    let candidates = enumerate_candidates(library, &shape_indices, rows, cols, blocked);
    if candidates.is_empty() {
        return Err(Error::NoPlacement);
    }

    let mut per_shape = vec![Vec::new(); library.shapes().len()];
    for (index, candidate) in candidates.iter().enumerate() {
        per_shape[candidate.shape_index].push(index);
    }

    let mut search = FitSearch {
        candidates: &candidates,
        per_shape,
        instances: &instances,
        used: M::zero(),
        stack: Vec::new(),
        solutions: Vec::new(),
    };
    search.run(0);
    if search.solutions.is_empty() {
        return Err(Error::NoSolution);
    }

    let shapes = library.shapes();
    Ok(search
        .solutions
        .into_iter()
        .map(|stack| {
            stack
                .into_iter()
                .map(|index| {
                    let candidate = &candidates[index];
                    Placement {
                        shape: shapes[candidate.shape_index].id.clone(),
                        rotation: candidate.rotation,
                        anchor: candidate.anchor,
                        cells: candidate.cells.clone(),
                    }
                })
                .collect()
        })
        .collect())
}

/// Reports how far a proposed solution deviates from the requirements.
///
/// Purely descriptive; the search never consults it.
pub fn validate(board: &Board, solution: &Solution, requirements: &Requirements) -> ValidationReport {
    let num_colors = requirements.num_colors();
    let mut report = ValidationReport::default();
    let mut claims: FxHashMap<Coord, usize> = FxHashMap::default();

    for color in 0..num_colors {
        let mut row_actual = vec![0i64; board.rows()];
        let mut col_actual = vec![0i64; board.cols()];
        if let Some(cells) = solution.cells.get(color) {
            for &cell in cells {
                row_actual[cell.0 as usize] += 1;
                col_actual[cell.1 as usize] += 1;
                *claims.entry(cell).or_insert(0) += 1;
            }
        }
        report.row_diffs.push(
            row_actual
                .iter()
                .zip(&requirements.rows)
                .map(|(&actual, required)| actual - i64::from(required[color]))
                .collect(),
        );
        report.col_diffs.push(
            col_actual
                .iter()
                .zip(&requirements.cols)
                .map(|(&actual, required)| actual - i64::from(required[color]))
                .collect(),
        );
    }

    let mut overlaps: Vec<Coord> = claims
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(cell, _)| cell)
        .collect();
    overlaps.sort_unstable();
    report.overlaps = overlaps;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements(rows: Vec<Vec<u32>>, cols: Vec<Vec<u32>>) -> Requirements {
        Requirements { rows, cols }
    }

    #[test]
    fn single_row_grid_admits_only_horizontal_rotations() {
        let library = ShapeLibrary::standard();
        let board = Board::new(1, 4);
        let requirements = requirements(
            vec![vec![4]],
            vec![vec![1], vec![1], vec![1], vec![1]],
        );
        let solutions = solve_counts(&library, &board, &requirements, &["line-2"]).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].placements[0].len(), 2);
        assert!(validate(&board, &solutions[0], &requirements).is_clean());
    }

    #[test]
    fn all_blocked_grid_has_no_placements() {
        let library = ShapeLibrary::standard();
        let mut board = Board::new(2, 2);
        for cell in board.coords().collect::<Vec<_>>() {
            board.set(cell, CellState::Blocked);
        }
        let requirements = requirements(vec![vec![1], vec![0]], vec![vec![1], vec![0]]);
        assert!(matches!(
            solve_counts(&library, &board, &requirements, &["line-2"]),
            Err(Error::NoPlacement)
        ));
    }

    #[test]
    fn all_zero_requirements_are_rejected() {
        let library = ShapeLibrary::standard();
        let board = Board::new(3, 3);
        let requirements = Requirements::zeros(3, 3, 1);
        assert!(matches!(
            solve_counts(&library, &board, &requirements, &["line-2"]),
            Err(Error::NoRequirements)
        ));
    }

    #[test]
    fn oversized_shape_yields_no_placements() {
        let library = ShapeLibrary::standard();
        let board = Board::new(2, 2);
        let requirements = requirements(
            vec![vec![2], vec![2]],
            vec![vec![2], vec![2]],
        );
        assert!(matches!(
            solve_counts(&library, &board, &requirements, &["cross-5"]),
            Err(Error::NoPlacement)
        ));
    }

    #[test]
    fn unsatisfiable_counts_exhaust_to_no_solution() {
        let library = ShapeLibrary::standard();
        let board = Board::new(3, 3);
        let requirements = requirements(
            vec![vec![3], vec![3], vec![3]],
            vec![vec![3], vec![3], vec![3]],
        );
        assert!(matches!(
            solve_counts(&library, &board, &requirements, &["square-4"]),
            Err(Error::NoSolution)
        ));
    }

    #[test]
    fn two_colors_compose_without_overlap() {
        let library = ShapeLibrary::standard();
        let board = Board::new(2, 2);
        let requirements = requirements(
            vec![vec![1, 1], vec![1, 1]],
            vec![vec![2, 0], vec![0, 2]],
        );
        let solutions = solve_counts(&library, &board, &requirements, &["line-2"]).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].cells[0], vec![(0, 0), (1, 0)]);
        assert_eq!(solutions[0].cells[1], vec![(0, 1), (1, 1)]);
        assert!(validate(&board, &solutions[0], &requirements).is_clean());
    }

    #[test]
    fn locked_cells_seed_counts_and_join_the_solution() {
        let library = ShapeLibrary::standard();
        let mut board = Board::new(3, 3);
        board.set((0, 0), CellState::Locked(Color(0)));
        let requirements = requirements(
            vec![vec![2], vec![1], vec![1]],
            vec![vec![1], vec![0], vec![3]],
        );
        let solutions = solve_counts(&library, &board, &requirements, &["line-3"]).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].cells[0], vec![(0, 0), (0, 2), (1, 2), (2, 2)]);
        assert_eq!(solutions[0].placements[0].len(), 1);
        assert!(validate(&board, &solutions[0], &requirements).is_clean());
    }

    #[test]
    fn solution_count_respects_the_puzzle_cap() {
        let library = ShapeLibrary::standard();
        let board = Board::new(4, 4);
        let requirements = requirements(
            vec![vec![2]; 4],
            vec![vec![2]; 4],
        );
        let solutions = solve_counts(&library, &board, &requirements, &["line-2"]).unwrap();
        assert!(!solutions.is_empty());
        assert!(solutions.len() <= MAX_PUZZLE_SOLUTIONS);
        for solution in &solutions {
            assert!(validate(&board, solution, &requirements).is_clean());
        }
    }

    #[test]
    fn exact_counts_use_each_instance_at_most_once() {
        let library = ShapeLibrary::standard();
        let board = Board::new(2, 2);
        let requirements = requirements(
            vec![vec![2], vec![2]],
            vec![vec![2], vec![2]],
        );
        let squares = vec![vec![("square-4".to_string(), 1)]];
        let solutions = solve_exact_counts(&library, &board, &requirements, &squares).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].placements[0].len(), 1);

        // a single domino cannot reach four cells
        let domino = vec![vec![("line-2".to_string(), 1)]];
        assert!(matches!(
            solve_exact_counts(&library, &board, &requirements, &domino),
            Err(Error::NoSolution)
        ));
    }

    #[test]
    fn fit_all_tiles_a_square_grid() {
        let library = ShapeLibrary::standard();
        let solutions =
            fit_all_pieces(&library, 4, 4, &[], &[("square-4".to_string(), 4)]).unwrap();
        assert_eq!(solutions.len(), 1);
        let mut anchors: Vec<Coord> = solutions[0].iter().map(|p| p.anchor).collect();
        anchors.sort_unstable();
        assert_eq!(anchors, vec![(0, 0), (0, 2), (2, 0), (2, 2)]);
    }

    #[test]
    fn fit_all_respects_blocked_cells() {
        let library = ShapeLibrary::standard();
        // blocking one corner leaves no room for four squares
        let result = fit_all_pieces(&library, 4, 4, &[(0, 0)], &[("square-4".to_string(), 4)]);
        assert!(matches!(result, Err(Error::NoSolution)));
    }

    #[test]
    fn validate_reports_diffs_and_overlaps() {
        let library = ShapeLibrary::standard();
        let board = Board::new(2, 2);
        let requirements = requirements(
            vec![vec![1, 1], vec![1, 1]],
            vec![vec![2, 0], vec![0, 2]],
        );
        let solutions = solve_counts(&library, &board, &requirements, &["line-2"]).unwrap();
        let mut broken = solutions[0].clone();
        // claim the same cell for both colors
        broken.cells[1] = broken.cells[0].clone();
        let report = validate(&board, &broken, &requirements);
        assert!(!report.is_clean());
        assert_eq!(report.overlaps, vec![(0, 0), (1, 0)]);
        assert_eq!(report.col_diffs[1], vec![2, -2]);
    }
}
