use super::offsets::{EnhanceEntry, EnhanceFamily};
use super::EnhanceParams;
use crate::grid::Grid;
use crate::prelude::{DualScorer, PixelScorer};
use crate::template::OffsetTable;

/// Which of the two results of the enhancement search a pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceOutput {
    /// Fuzzy enhancement in [0, 1].
    Value,
    /// Line orientation, perpendicular to the winning template angle.
    Direction,
}

/// Non-fuzzy enhancement of one angle: the center mean minus the mean of the
/// two side averages, with missing side samples counted as zero.
///
/// When the pixel stands out from both sides by more than
/// `min_end_difference` it may be a line end, so only the brighter half of
/// the center line is used.
pub(crate) fn enhancement_at(
    entry: &EnhanceEntry,
    grid: &Grid,
    x: usize,
    y: usize,
    center_value: f32,
    params: &EnhanceParams,
) -> Option<f32> {
    let mut center = entry.center.average(grid, x, y)?;
    let sides = (entry.left.average_missing_as_zero(grid, x, y)
        + entry.right.average_missing_as_zero(grid, x, y))
        / 2.0;
    let side_peak = entry
        .left
        .max_missing_as_zero(grid, x, y)
        .max(entry.right.max_missing_as_zero(grid, x, y));
    if center_value - 2.0 * side_peak > params.min_end_difference {
        let halves = [
            entry.center_forward.average(grid, x, y),
            entry.center_backward.average(grid, x, y),
        ];
        if let Some(larger) = halves.into_iter().flatten().reduce(f32::max) {
            center = larger;
        }
    }
    Some(center - sides)
}

/// Scores every angle and returns the winning index with its non-fuzzy value.
pub(crate) fn best_angle(
    table: &OffsetTable<EnhanceFamily>,
    grid: &Grid,
    x: usize,
    y: usize,
    params: &EnhanceParams,
) -> Option<(usize, f32)> {
    let center_value = grid.get(x, y)?;
    let mut best: Option<(usize, f32)> = None;
    for (index, entry) in table.entries().iter().enumerate() {
        let Some(value) = enhancement_at(entry, grid, x, y, center_value, params) else {
            continue;
        };
        if best.map_or(true, |(_, current)| value > current) {
            best = Some((index, value));
        }
    }
    best
}

/// The ladder angle perpendicular to angle `index`. The ladder must have an
/// even number of angles.
pub(crate) fn perpendicular(table: &OffsetTable<EnhanceFamily>, index: usize) -> f32 {
    let window = table.window();
    let count = window.angle_count();
    debug_assert_eq!(count % 2, 0, "enhance ladder of {} angles", count);
    window.ith_angle((index + count / 2) % count)
}

pub struct EnhanceScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) table: &'a OffsetTable<EnhanceFamily>,
    pub(crate) params: &'a EnhanceParams,
    pub(crate) output: EnhanceOutput,
}

impl EnhanceScorer<'_> {
    /// Fuzzy enhancement and line orientation from a single angle search.
    fn evaluate(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let (index, value) = best_angle(self.table, self.input, x, y, self.params)?;
        Some((
            self.params.enhancement.apply(value).clamp(0.0, 1.0),
            perpendicular(self.table, index),
        ))
    }
}

impl PixelScorer for EnhanceScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        let (value, direction) = self.evaluate(x, y)?;
        match self.output {
            EnhanceOutput::Value => Some(value),
            EnhanceOutput::Direction => Some(direction),
        }
    }
}

/// Writes the enhancement into the first grid and the direction into the
/// second; `output` is ignored.
impl DualScorer for EnhanceScorer<'_> {
    fn score_pair(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        self.evaluate(x, y)
    }
}
