//! Failure kinds shared by the solver and generator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a solve or generate can fail.
///
/// Messages are informational; callers should branch on the variant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("duplicate shape id: {0}")]
    DuplicateShapeId(String),
    #[error("no shape in the pool fits the remaining budget")]
    NoShapesFit,
    #[error("no valid placement exists")]
    NoPlacement,
    #[error("all row and column requirements are zero")]
    NoRequirements,
    #[error("no solution satisfies the requirements")]
    NoSolution,
    #[error("time budget exhausted before a puzzle was generated")]
    DeadlineExceeded,
}
