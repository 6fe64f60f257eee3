use crate::grid::Grid;
use crate::math::StatsHelper;

/// Relative sample positions bound to one grid width.
///
/// Each point is kept both as `(dx, dy)` and as the row-major index delta
/// `dy * nx + dx`, so sampling at a pixel is a slice lookup. Callers must
/// only sample at pixels where the whole template lies inside the grid
/// (see [`OffsetTable::out_of_range`](super::OffsetTable::out_of_range)).
#[derive(Debug, Clone, PartialEq)]
pub struct Offsets {
    points: Vec<(isize, isize)>,
    along: Vec<f32>,
    deltas: Vec<isize>,
    nx: usize,
}

impl Offsets {
    /// Samples the line through the origin at `angle` degrees, shifted by
    /// `lateral` cells along the left normal.
    pub fn along_line(angle: f32, positions: &[f32], lateral: f32, nx: usize) -> Self {
        let radians = f64::from(angle).to_radians();
        let (sin, cos) = (snap(radians.sin()), snap(radians.cos()));
        let lateral = f64::from(lateral);
        let mut points = Vec::with_capacity(positions.len());
        let mut along = Vec::with_capacity(positions.len());
        for &t in positions {
            let axial = f64::from(t);
            let dx = axial * cos - lateral * sin;
            let dy = axial * sin + lateral * cos;
            points.push((dx.round() as isize, dy.round() as isize));
            along.push(t);
        }
        Self::bind(points, along, nx)
    }

    /// Union of lines at each lateral shift, with repeated cells dropped.
    pub fn rectangle(angle: f32, positions: &[f32], laterals: &[f32], nx: usize) -> Self {
        let mut points: Vec<(isize, isize)> = Vec::new();
        let mut along = Vec::new();
        for &lateral in laterals {
            let line = Self::along_line(angle, positions, lateral, nx);
            for (point, t) in line.points.into_iter().zip(line.along) {
                if !points.contains(&point) {
                    points.push(point);
                    along.push(t);
                }
            }
        }
        Self::bind(points, along, nx)
    }

    /// Square neighborhood of the given radius around the origin.
    pub fn neighborhood(radius: isize, nx: usize) -> Self {
        let mut points = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                points.push((dx, dy));
            }
        }
        let along = vec![0.0; points.len()];
        Self::bind(points, along, nx)
    }

    fn bind(points: Vec<(isize, isize)>, along: Vec<f32>, nx: usize) -> Self {
        let deltas = points
            .iter()
            .map(|&(dx, dy)| dy * nx as isize + dx)
            .collect();
        Self {
            points,
            along,
            deltas,
            nx,
        }
    }

    /// Keeps only the samples whose axial position satisfies `keep`.
    pub fn filter_along<P>(&self, keep: P) -> Self
    where
        P: Fn(f32) -> bool,
    {
        let (points, along): (Vec<_>, Vec<_>) = self
            .points
            .iter()
            .zip(&self.along)
            .filter(|(_, t)| keep(**t))
            .map(|(&p, &t)| (p, t))
            .unzip();
        Self::bind(points, along, self.nx)
    }

    /// Samples ahead of (t > 0) and behind (t < 0) the template center.
    pub fn split_halves(&self) -> (Self, Self) {
        (self.filter_along(|t| t > 0.0), self.filter_along(|t| t < 0.0))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(isize, isize)] {
        &self.points
    }

    pub fn bound_width(&self) -> usize {
        self.nx
    }

    /// Largest `max(|dx|, |dy|)` over all samples.
    pub fn max_offset(&self) -> usize {
        self.points
            .iter()
            .map(|&(dx, dy)| dx.unsigned_abs().max(dy.unsigned_abs()))
            .max()
            .unwrap_or(0)
    }

    fn samples<'a>(&'a self, grid: &'a Grid, x: usize, y: usize) -> impl Iterator<Item = Option<f32>> + 'a {
        assert_eq!(grid.nx(), self.nx, "offsets bound to one width sampled on a grid of another");
        let base = (y * self.nx + x) as isize;
        self.deltas.iter().map(move |&d| grid.get_index(base + d))
    }

    /// Every sample, `None` where missing.
    pub fn fill(&self, grid: &Grid, x: usize, y: usize, out: &mut Vec<Option<f32>>) {
        out.clear();
        out.extend(self.samples(grid, x, y));
    }

    /// Valid sample values only.
    pub fn values(&self, grid: &Grid, x: usize, y: usize) -> Vec<f32> {
        self.samples(grid, x, y).flatten().collect()
    }

    pub fn count_valid(&self, grid: &Grid, x: usize, y: usize) -> usize {
        self.samples(grid, x, y).flatten().count()
    }

    /// Mean of the valid samples; `None` when none are valid.
    pub fn average(&self, grid: &Grid, x: usize, y: usize) -> Option<f32> {
        StatsHelper::mean(&self.values(grid, x, y))
    }

    /// Mean over every sample with missing samples counted as zero.
    pub fn average_missing_as_zero(&self, grid: &Grid, x: usize, y: usize) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.samples(grid, x, y).map(|v| v.unwrap_or(0.0)).sum();
        sum / self.len() as f32
    }

    /// Fraction of samples that are missing, in [0, 1].
    pub fn missing_fraction(&self, grid: &Grid, x: usize, y: usize) -> f32 {
        if self.is_empty() {
            return 1.0;
        }
        let missing = self.samples(grid, x, y).filter(Option::is_none).count();
        missing as f32 / self.len() as f32
    }

    pub fn max(&self, grid: &Grid, x: usize, y: usize) -> Option<f32> {
        self.samples(grid, x, y).flatten().reduce(f32::max)
    }

    pub fn max_missing_as_zero(&self, grid: &Grid, x: usize, y: usize) -> f32 {
        self.samples(grid, x, y)
            .map(|v| v.unwrap_or(0.0))
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    pub fn variance(&self, grid: &Grid, x: usize, y: usize) -> Option<f32> {
        StatsHelper::variance(&self.values(grid, x, y))
    }
}

/// Rounds trig factors to six decimals so axis-aligned templates sample
/// exactly on the axes.
fn snap(value: f64) -> f64 {
    (value * 1.0e6).round() / 1.0e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MISSING_INTEREST;
    use approx::assert_abs_diff_eq;

    fn ramp_grid() -> Grid {
        Grid::from_fn(9, 9, MISSING_INTEREST, |x, _| x as f32)
    }

    #[test]
    #[should_panic(expected = "grid of another")]
    fn sampling_a_grid_of_another_width_panics() {
        let offsets = Offsets::along_line(0.0, &[0.0, 1.0], 0.0, 40);
        let grid = Grid::from_fn(30, 30, MISSING_INTEREST, |_, _| 1.0);
        offsets.values(&grid, 10, 10);
    }

    #[test]
    fn horizontal_line_samples_columns() {
        let offsets = Offsets::along_line(0.0, &[-2.0, -1.0, 0.0, 1.0, 2.0], 0.0, 9);
        assert_eq!(offsets.points(), &[(-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0)]);
        let grid = ramp_grid();
        assert_eq!(offsets.values(&grid, 4, 4), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_abs_diff_eq!(offsets.average(&grid, 4, 4).unwrap(), 4.0);
        assert_eq!(offsets.max(&grid, 4, 4), Some(6.0));
    }

    #[test]
    fn lateral_shift_moves_to_left_normal() {
        let offsets = Offsets::along_line(0.0, &[0.0], 2.0, 9);
        assert_eq!(offsets.points(), &[(0, 2)]);
        let vertical = Offsets::along_line(90.0, &[0.0], 2.0, 9);
        assert_eq!(vertical.points(), &[(-2, 0)]);
    }

    #[test]
    fn missing_samples_are_tracked() {
        let mut grid = ramp_grid();
        grid.set_missing(3, 4);
        let offsets = Offsets::along_line(0.0, &[-1.0, 0.0, 1.0, 2.0], 0.0, 9);
        assert_eq!(offsets.count_valid(&grid, 4, 4), 3);
        assert_abs_diff_eq!(offsets.missing_fraction(&grid, 4, 4), 0.25);
        assert_abs_diff_eq!(offsets.average_missing_as_zero(&grid, 4, 4), 15.0 / 4.0);
        let mut filled = Vec::new();
        offsets.fill(&grid, 4, 4, &mut filled);
        assert_eq!(filled, vec![None, Some(4.0), Some(5.0), Some(6.0)]);
    }

    #[test]
    fn halves_exclude_center() {
        let offsets = Offsets::along_line(0.0, &[-2.0, -1.0, 0.0, 1.0, 2.0], 0.0, 9);
        let (forward, backward) = offsets.split_halves();
        assert_eq!(forward.points(), &[(1, 0), (2, 0)]);
        assert_eq!(backward.points(), &[(-2, 0), (-1, 0)]);
    }

    #[test]
    fn rectangle_drops_repeated_cells() {
        let offsets = Offsets::rectangle(0.0, &[-1.0, 0.0, 1.0], &[-0.2, 0.0, 0.2], 9);
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets.max_offset(), 1);
    }

    #[test]
    fn neighborhood_is_square() {
        let offsets = Offsets::neighborhood(1, 9);
        assert_eq!(offsets.len(), 9);
        assert_abs_diff_eq!(offsets.average(&ramp_grid(), 4, 4).unwrap(), 4.0);
    }
}
