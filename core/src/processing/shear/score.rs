use super::offsets::{ShearEntry, ShearFamily};
use super::ShearParams;
use crate::grid::Grid;
use crate::math::angle;
use crate::prelude::PixelScorer;
use crate::template::OffsetTable;

/// Which template side lies farther from the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterSide {
    Left,
    Right,
}

/// Compares the radar-to-pixel bearing with the template's right-pointing
/// normal. `None` when the template is not radially aligned within
/// `cut_angle`.
pub fn outer_side(template_angle: f32, x: usize, y: usize, params: &ShearParams) -> Option<OuterSide> {
    let right_pointing = template_angle - 90.0;
    let bearing = angle::bearing(params.radar_x, params.radar_y, x as f32, y as f32);
    let separation = angle::separation(bearing, right_pointing);
    if separation <= params.cut_angle {
        Some(OuterSide::Right)
    } else if separation >= 180.0 - params.cut_angle {
        Some(OuterSide::Left)
    } else {
        None
    }
}

fn passes_gate(
    table: &OffsetTable<ShearFamily>,
    secondary: Option<&Grid>,
    x: usize,
    y: usize,
    params: &ShearParams,
) -> bool {
    match (secondary, params.secondary_gate) {
        (Some(field), Some(gate)) => table
            .neighborhood()
            .max(field, x, y)
            .is_some_and(|peak| gate.contains(peak)),
        _ => true,
    }
}

fn side_means(entry: &ShearEntry, grid: &Grid, x: usize, y: usize) -> Option<(f32, f32)> {
    Some((entry.left.average(grid, x, y)?, entry.right.average(grid, x, y)?))
}

/// Direction pass: the ladder angle with the largest side difference.
pub struct ShearDirectionScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) secondary: Option<&'a Grid>,
    pub(crate) table: &'a OffsetTable<ShearFamily>,
    pub(crate) params: &'a ShearParams,
}

impl PixelScorer for ShearDirectionScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        if !passes_gate(self.table, self.secondary, x, y, self.params) {
            return None;
        }
        let mut best: Option<(f32, f32)> = None;
        for entry in self.table.entries() {
            let Some((left, right)) = side_means(entry, self.input, x, y) else {
                continue;
            };
            let shear = (right - left).abs();
            if best.map_or(true, |(magnitude, _)| shear > magnitude) {
                best = Some((shear, entry.angle));
            }
        }
        let (shear, angle) = best?;
        if shear <= 0.0 || shear < self.params.min_shear {
            return None;
        }
        Some(angle)
    }
}

/// Detection pass: fuzzy shear interest at a previously chosen angle.
pub struct ShearDetectionScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) direction: &'a Grid,
    pub(crate) secondary: Option<&'a Grid>,
    pub(crate) table: &'a OffsetTable<ShearFamily>,
    pub(crate) params: &'a ShearParams,
}

impl PixelScorer for ShearDetectionScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let angle = self.direction.get(x, y)?;
        if !passes_gate(self.table, self.secondary, x, y, self.params) {
            return None;
        }
        let entry = self.table.lookup(angle)?;
        interest_at(entry, self.input, x, y, self.params)
    }
}

pub(crate) fn interest_at(
    entry: &ShearEntry,
    grid: &Grid,
    x: usize,
    y: usize,
    params: &ShearParams,
) -> Option<f32> {
    let (left, right) = side_means(entry, grid, x, y)?;
    let (inner, outer) = match outer_side(entry.angle, x, y, params)? {
        OuterSide::Right => (left, right),
        OuterSide::Left => (right, left),
    };
    if inner == outer || (inner > outer) != params.is_convergent {
        return None;
    }

    let mean = (left + right) / 2.0;
    let larger = if right > left {
        &entry.right_fine
    } else {
        &entry.left_fine
    };
    let samples = larger.values(grid, x, y);
    if samples.is_empty() {
        return None;
    }
    let total: f32 = samples
        .iter()
        .map(|&v| params.side_vs_mean.apply(v - mean))
        .sum();
    Some((total / samples.len() as f32).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params_with_radar(radar_x: f32, radar_y: f32) -> ShearParams {
        ShearParams {
            radar_x,
            radar_y,
            cut_angle: 30.0,
            ..ShearParams::default()
        }
    }

    #[test]
    fn radial_template_identifies_outer_side() {
        let params = params_with_radar(0.0, 0.0);
        assert_eq!(outer_side(90.0, 20, 0, &params), Some(OuterSide::Right));
        assert_eq!(outer_side(90.0, 0, 20, &params), None);
        assert_eq!(outer_side(0.0, 0, 20, &params), Some(OuterSide::Left));
    }

    #[test]
    fn larger_side_drives_interest() {
        let grid = Grid::from_fn(21, 21, -99.0, |x, _| if x < 10 { 10.0 } else { -10.0 });
        let table: OffsetTable<ShearFamily> =
            OffsetTable::build(crate::template::Window::new(5.0, 3.0).unwrap(), 21);
        let params = ShearParams {
            radar_x: -50.0,
            radar_y: 10.0,
            side_vs_mean: crate::math::FuzzyFunction::ramp(0.0, 20.0),
            ..ShearParams::default()
        };
        let value = interest_at(table.lookup(90.0).unwrap(), &grid, 10, 10, &params).unwrap();
        assert_abs_diff_eq!(value, 0.5);
    }
}
