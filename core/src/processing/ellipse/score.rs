use super::offsets::{EllipseEntry, EllipseFamily};
use super::{EllipseMode, EllipseParams};
use crate::grid::Grid;
use crate::math::StatsHelper;
use crate::prelude::PixelScorer;
use crate::template::OffsetTable;

/// Window average or variance, depending on the mode. `None` when too few
/// samples are valid.
pub(crate) fn statistic(entry: &EllipseEntry, grid: &Grid, x: usize, y: usize, params: &EllipseParams) -> Option<f32> {
    let values = entry.window.values(grid, x, y);
    if (values.len() as f32) < params.min_valid_fraction * entry.window.len() as f32 {
        return None;
    }
    match params.mode {
        EllipseMode::MaxAverage => StatsHelper::mean(&values),
        EllipseMode::MinVariance | EllipseMode::MaxVariance => StatsHelper::variance(&values),
    }
}

fn improves(mode: EllipseMode, candidate: f32, current: f32) -> bool {
    match mode {
        EllipseMode::MaxAverage | EllipseMode::MaxVariance => candidate > current,
        EllipseMode::MinVariance => candidate < current,
    }
}

/// Orientation pass: the ladder angle with the extreme window statistic.
pub struct EllipseOrientationScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) table: &'a OffsetTable<EllipseFamily>,
    pub(crate) params: &'a EllipseParams,
}

impl PixelScorer for EllipseOrientationScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let peak = self.table.neighborhood().max(self.input, x, y)?;
        if peak < self.params.smooth_threshold {
            return None;
        }
        let mut best: Option<(f32, f32)> = None;
        for entry in self.table.entries() {
            let Some(value) = statistic(entry, self.input, x, y, self.params) else {
                continue;
            };
            if best.map_or(true, |(current, _)| improves(self.params.mode, value, current)) {
                best = Some((value, entry.angle));
            }
        }
        best.map(|(_, angle)| angle)
    }
}

/// Interest pass: the window statistic at a previously chosen orientation.
pub struct EllipseInterestScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) orientation: &'a Grid,
    pub(crate) table: &'a OffsetTable<EllipseFamily>,
    pub(crate) params: &'a EllipseParams,
}

impl PixelScorer for EllipseInterestScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let angle = self.orientation.get(x, y)?;
        let entry = self.table.lookup(angle)?;
        statistic(entry, self.input, x, y, self.params)
    }
}

/// Confidence pass: fuzzy membership of the mean valid fraction of the two
/// template halves.
pub struct EllipseConfidenceScorer<'a> {
    pub(crate) input: &'a Grid,
    pub(crate) orientation: &'a Grid,
    pub(crate) table: &'a OffsetTable<EllipseFamily>,
    pub(crate) params: &'a EllipseParams,
}

impl PixelScorer for EllipseConfidenceScorer<'_> {
    fn score(&self, x: usize, y: usize) -> Option<f32> {
        if self.table.out_of_range(x, y, self.input.ny()) {
            return None;
        }
        let angle = self.orientation.get(x, y)?;
        let entry = self.table.lookup(angle)?;
        let forward_good = 1.0 - entry.forward.missing_fraction(self.input, x, y);
        let backward_good = 1.0 - entry.backward.missing_fraction(self.input, x, y);
        let good = (forward_good + backward_good) / 2.0;
        Some(self.params.confidence.apply(good).clamp(0.0, 1.0))
    }
}
