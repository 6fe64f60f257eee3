use crate::prelude::{ColideError, ColideResult};
use ndarray::{Array2, ArrayView1, Axis};

/// Missing value written to direction and orientation grids.
pub const MISSING_ANGLE: f32 = -1.0;
/// Missing value written to interest, confidence and enhancement grids.
pub const MISSING_INTEREST: f32 = -99.0;

/// Dense row-major grid of floating cells with a missing sentinel.
///
/// Storage is an `(ny, nx)` array so that row `y` is contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Array2<f32>,
    missing: f32,
}

impl Grid {
    /// Creates a grid with every cell set to `missing`.
    pub fn new(nx: usize, ny: usize, missing: f32) -> Self {
        Self {
            data: Array2::from_elem((ny, nx), missing),
            missing,
        }
    }

    pub fn from_vec(nx: usize, ny: usize, values: Vec<f32>, missing: f32) -> ColideResult<Self> {
        let data = Array2::from_shape_vec((ny, nx), values).map_err(|err| {
            ColideError::InvalidConfig(format!("grid values do not fit {}x{}: {}", nx, ny, err))
        })?;
        Ok(Self { data, missing })
    }

    /// Builds a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn<F>(nx: usize, ny: usize, missing: f32, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        Self {
            data: Array2::from_shape_fn((ny, nx), |(y, x)| f(x, y)),
            missing,
        }
    }

    /// Same shape as `self`, every cell set to the new `missing` value.
    pub fn same_shape_with_missing(&self, missing: f32) -> Self {
        Self::new(self.nx(), self.ny(), missing)
    }

    pub fn nx(&self) -> usize {
        self.data.ncols()
    }

    pub fn ny(&self) -> usize {
        self.data.nrows()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx(), self.ny())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn missing(&self) -> f32 {
        self.missing
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.shape() == other.shape()
    }

    pub fn is_missing_value(&self, value: f32) -> bool {
        value.is_nan() || value == self.missing
    }

    /// Value at `(x, y)`, or `None` when the cell is missing or outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.data
            .get((y, x))
            .copied()
            .filter(|&v| !self.is_missing_value(v))
    }

    /// Signed variant of [`Grid::get`] used by neighborhood sampling.
    pub fn get_signed(&self, x: isize, y: isize) -> Option<f32> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Value at a linear row-major index.
    pub fn get_index(&self, index: isize) -> Option<f32> {
        let nx = self.nx();
        if index < 0 || nx == 0 {
            return None;
        }
        let index = index as usize;
        self.get(index % nx, index / nx)
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if let Some(cell) = self.data.get_mut((y, x)) {
            *cell = value;
        }
    }

    pub fn set_missing(&mut self, x: usize, y: usize) {
        let missing = self.missing;
        self.set(x, y, missing);
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn fill_missing(&mut self) {
        let missing = self.missing;
        self.data.fill(missing);
    }

    pub fn row(&self, y: usize) -> ArrayView1<'_, f32> {
        self.data.index_axis(Axis(0), y)
    }

    /// Number of cells holding a valid value.
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&v| !self.is_missing_value(v))
            .count()
    }

    /// Valid values in row-major order.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data
            .iter()
            .copied()
            .filter(move |&v| !self.is_missing_value(v))
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Mutable row views, one per row, for row-partitioned writers.
    pub(crate) fn rows_mut(&mut self) -> ndarray::iter::AxisIterMut<'_, f32, ndarray::Ix1> {
        self.data.axis_iter_mut(Axis(0))
    }
}
