//! Oriented-template feature detection over 2-D radar grids.
//!
//! Four detector families (thin lines, radial shear, elliptical orientation
//! and line enhancement) share one engine: rotated sampling templates built
//! once per grid width, fuzzy scoring per pixel, and row-parallel evaluation
//! on a fixed-size worker pool.

pub mod grid;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod template;

pub use grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
pub use prelude::{ColideError, ColideResult, DetectorKind};
