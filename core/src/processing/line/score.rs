use super::offsets::{LineEntry, LineFamily};
use super::LineParams;
use crate::grid::Grid;
use crate::math::StatsHelper;
use crate::prelude::PixelScorer;
use crate::template::{OffsetTable, Offsets};

/// Added to the center mean so every accepted raw score is positive and a
/// flat template scores exactly this much.
pub const RAW_OFFSET: f32 = 100.0;

const EPSILON: f32 = 1.0e-6;

/// Mean of one side of the template.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Mean(f32),
    /// No valid samples; counts as zero.
    Empty,
}

impl Side {
    fn value(self) -> f32 {
        match self {
            Side::Mean(v) => v,
            Side::Empty => 0.0,
        }
    }
}

/// `None` rejects the angle: the side is partially missing and partial
/// sides are not tolerated.
fn side_mean(offsets: &Offsets, grid: &Grid, x: usize, y: usize, allow_partial: bool) -> Option<Side> {
    let values = offsets.values(grid, x, y);
    if values.is_empty() {
        return Some(Side::Empty);
    }
    if values.len() < offsets.len() && !allow_partial {
        return None;
    }
    StatsHelper::mean(&values).map(Side::Mean)
}

/// The 3x3 neighborhood must be at least half valid and its mean must be a
/// plausible line-center intensity.
pub(crate) fn passes_precheck(
    table: &OffsetTable<LineFamily>,
    grid: &Grid,
    x: usize,
    y: usize,
    params: &LineParams,
) -> bool {
    let neighborhood = table.neighborhood();
    let values = neighborhood.values(grid, x, y);
    if 2 * (neighborhood.len() - values.len()) > neighborhood.len() {
        return false;
    }
    match StatsHelper::mean(&values) {
        Some(mean) => params.center_intensity.apply(mean) > 0.0,
        None => false,
    }
}

/// `(center + 100) - (left + right) / 2` for one angle.
pub(crate) fn raw_score(entry: &LineEntry, grid: &Grid, x: usize, y: usize, params: &LineParams) -> Option<f32> {
    let center = entry.center.average(grid, x, y)?;
    let left = side_mean(&entry.left, grid, x, y, params.allow_partial_sides)?;
    let right = side_mean(&entry.right, grid, x, y, params.allow_partial_sides)?;
    if left == Side::Empty && right == Side::Empty {
        return None;
    }
    Some(center + RAW_OFFSET - (left.value() + right.value()) / 2.0)
}

/// Direction pass: the ladder angle with the largest raw score.
pub struct LineDirectionScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) table: &'a OffsetTable<LineFamily>,
    pub(crate) params: &'a LineParams,
}

impl PixelScorer for LineDirectionScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        if !passes_precheck(self.table, self.input, x, y, self.params) {
            return None;
        }
        let mut best: Option<(f32, f32)> = None;
        let mut worst = f32::INFINITY;
        for entry in self.table.entries() {
            let Some(raw) = raw_score(entry, self.input, x, y, self.params) else {
                continue;
            };
            worst = worst.min(raw);
            if best.map_or(true, |(score, _)| raw > score) {
                best = Some((raw, entry.angle));
            }
        }
        let (score, angle) = best?;
        if score <= RAW_OFFSET + EPSILON || score - worst <= EPSILON {
            return None;
        }
        Some(angle)
    }
}

/// Detection pass: fuzzy line interest at a previously chosen angle.
pub struct LineDetectionScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) direction: &'a Grid,
    pub(crate) table: &'a OffsetTable<LineFamily>,
    pub(crate) params: &'a LineParams,
}

impl PixelScorer for LineDetectionScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let angle = self.direction.get(x, y)?;
        if !passes_precheck(self.table, self.input, x, y, self.params) {
            return None;
        }
        let entry = self.table.lookup(angle)?;
        interest_at(entry, self.input, x, y, self.params)
    }
}

pub(crate) fn interest_at(entry: &LineEntry, grid: &Grid, x: usize, y: usize, params: &LineParams) -> Option<f32> {
    let center = entry.center.values(grid, x, y);
    let center_mean = StatsHelper::mean(&center)?;
    let center_spread = StatsHelper::std_dev(&center).unwrap_or(0.0);
    let center_score: f32 = center
        .iter()
        .map(|&v| params.center_in_range.apply(v))
        .sum();

    let mut sides = entry.left_fine.values(grid, x, y);
    sides.extend(entry.right_fine.values(grid, x, y));
    let side_score: f32 = sides
        .iter()
        .map(|&v| params.side_offset.apply(center_mean - v))
        .sum();

    let n_center = center.len() as f32;
    let n_side = sides.len() as f32;
    let weight = if n_side > 0.0 { n_center / n_side } else { 0.0 };
    let denominator = n_center + weight * n_side;
    if denominator < EPSILON {
        return None;
    }
    let value = (center_score + weight * side_score) / denominator
        * params.center_stddev.apply(center_spread);
    Some(value.clamp(0.0, 1.0))
}
