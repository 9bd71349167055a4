//! Shape definitions and the rotation-indexed shape library.
//!
//! Each shape is defined as a set of unit cell positions normalized to start
//! at the origin. The library precomputes every unique rotation once; solves
//! and generates only read from it afterwards.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::geometry::{self, Coord};

/// The built-in shape catalog as (id, name, base cells).
pub const STANDARD_SHAPES: &[(&str, &str, &[Coord])] = &[
    ("line-2", "Domino", &[(0, 0), (0, 1)]),
    ("line-3", "Triple line", &[(0, 0), (0, 1), (0, 2)]),
    ("corner-3", "Corner", &[(0, 0), (0, 1), (1, 0)]),
    ("line-4", "Quad line", &[(0, 0), (0, 1), (0, 2), (0, 3)]),
    ("square-4", "Square", &[(0, 0), (0, 1), (1, 0), (1, 1)]),
    ("tee-4", "Tee", &[(0, 0), (0, 1), (0, 2), (1, 1)]),
    ("ell-4", "Ell", &[(0, 0), (1, 0), (2, 0), (2, 1)]),
    ("ess-4", "Ess", &[(0, 1), (0, 2), (1, 0), (1, 1)]),
    ("cross-5", "Cross", &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)]),
];

/// A shape definition: stable identifier, display name, base cells.
#[derive(Clone, Debug)]
pub struct ShapeDef {
    pub id: String,
    pub name: String,
    pub cells: Vec<Coord>,
}

/// The built-in catalog as definitions, e.g. to extend before building.
pub fn standard_defs() -> Vec<ShapeDef> {
    STANDARD_SHAPES
        .iter()
        .map(|&(id, name, cells)| ShapeDef {
            id: id.to_string(),
            name: name.to_string(),
            cells: cells.to_vec(),
        })
        .collect()
}

/// One orientation of a shape: normalized sorted cells plus bounding box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rotation {
    pub cells: Vec<Coord>,
    pub height: usize,
    pub width: usize,
}

/// A shape with all unique rotations precomputed.
///
/// `cell_count` is stable across rotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    pub id: String,
    pub name: String,
    pub cell_count: usize,
    pub rotations: Vec<Rotation>,
}

/// Indexed, immutable collection of shapes.
#[derive(Clone, Debug)]
pub struct ShapeLibrary {
    shapes: Vec<Shape>,
    by_id: FxHashMap<String, usize>,
}

impl ShapeLibrary {
    /// Builds a library from shape definitions, precomputing rotations.
    ///
    /// Rejects duplicate identifiers, empty definitions and definitions with
    /// repeated cells.
    pub fn build(definitions: &[ShapeDef]) -> Result<Self> {
        let mut shapes = Vec::with_capacity(definitions.len());
        let mut by_id = FxHashMap::default();

        for definition in definitions {
            if definition.cells.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "shape {:?} has no cells",
                    definition.id
                )));
            }
            let base = geometry::normalize_to_origin(definition.cells.clone());
            if base.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(Error::InvalidConfig(format!(
                    "shape {:?} repeats a cell",
                    definition.id
                )));
            }
            if by_id.contains_key(&definition.id) {
                return Err(Error::DuplicateShapeId(definition.id.clone()));
            }

            let rotations = geometry::unique_rotations(&base)
                .into_iter()
                .map(|cells| {
                    let (height, width) = geometry::bounds(&cells);
                    Rotation {
                        cells,
                        height,
                        width,
                    }
                })
                .collect();

            by_id.insert(definition.id.clone(), shapes.len());
            shapes.push(Shape {
                id: definition.id.clone(),
                name: definition.name.clone(),
                cell_count: definition.cells.len(),
                rotations,
            });
        }

        Ok(Self { shapes, by_id })
    }

    /// Builds the library of built-in shapes.
    pub fn standard() -> Self {
        // the catalog is a static table with distinct ids
        Self::build(&standard_defs()).expect("built-in shape catalog is valid")
    }

    /// Looks up a shape by its identifier.
    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.index_of(id).map(|index| &self.shapes[index])
    }

    /// Position of a shape in [`Self::shapes`], if present.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// All shapes in definition order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// All shape identifiers in definition order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|shape| shape.id.as_str())
    }
}
