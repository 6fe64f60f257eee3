use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
pub use crate::processing::dispatch::{CancelToken, PassState};
pub use crate::template::{OffsetTable, Window};

/// The closed set of oriented-template detector families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Line,
    Shear,
    Ellipse,
    Enhance,
}

impl DetectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::Line => "line",
            DetectorKind::Shear => "shear",
            DetectorKind::Ellipse => "ellipse",
            DetectorKind::Enhance => "enhance",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invocation-level failures. Per-pixel conditions never surface here; they
/// are written as the missing sentinel of the output grid.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ColideError {
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("grid shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("grid has no cells")]
    EmptyGrid,
    #[error("offset table bound to width {table_nx} used on grid of width {grid_nx}")]
    StaleOffsetTable { table_nx: usize, grid_nx: usize },
    #[error("worker pool: {0}")]
    WorkerPool(String),
    #[error("pass cancelled after {rows_completed} of {rows_total} rows")]
    Cancelled {
        rows_completed: usize,
        rows_total: usize,
    },
}

pub type ColideResult<T> = Result<T, ColideError>;

/// Scores one pixel of a pass. `None` marks the cell missing.
///
/// Implementations hold read-only borrows of the input grids and the offset
/// table, so a single scorer is shared by every worker thread of a pass.
pub trait PixelScorer: Sync {
    fn score(&self, x: usize, y: usize) -> Option<f32>;
}

/// Scores two output grids from one evaluation of each pixel.
pub trait DualScorer: Sync {
    fn score_pair(&self, x: usize, y: usize) -> Option<(f32, f32)>;
}

/// Checks that every grid of an invocation has the shape of the first one.
pub fn ensure_same_shape(reference: &Grid, others: &[&Grid]) -> ColideResult<()> {
    if reference.nx() == 0 || reference.ny() == 0 {
        return Err(ColideError::EmptyGrid);
    }
    for other in others {
        if !reference.same_shape(other) {
            return Err(ColideError::ShapeMismatch {
                expected: reference.shape(),
                found: other.shape(),
            });
        }
    }
    Ok(())
}
