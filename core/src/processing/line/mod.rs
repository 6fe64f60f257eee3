//! Thin-line (convergence line) detection.
//!
//! A direction pass picks, per pixel, the ladder angle along which the center
//! of the template is brightest relative to its sides. A detection pass then
//! scores the pixel at a supplied direction with fuzzy memberships of the
//! center samples, the double-resolution side samples, and the center spread.

mod offsets;
mod score;

pub use offsets::{LineEntry, LineFamily};
pub use score::{LineDetectionScorer, LineDirectionScorer, RAW_OFFSET};

use crate::grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
use crate::math::FuzzyFunction;
use crate::prelude::{ensure_same_shape, ColideResult};
use crate::processing::orchestrator::RowOrchestrator;
use crate::template::TemplateSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineParams {
    /// Plausibility of the 3x3 mean as a line-center intensity; zero rejects.
    pub center_intensity: FuzzyFunction,
    /// Membership of each center sample in the line intensity range.
    pub center_in_range: FuzzyFunction,
    /// Membership of `center mean - side sample`.
    pub side_offset: FuzzyFunction,
    /// Membership of the center standard deviation.
    pub center_stddev: FuzzyFunction,
    /// Accept sides that are only partially missing.
    pub allow_partial_sides: bool,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            center_intensity: FuzzyFunction::trapezoid(0.0, 5.0, 25.0, 35.0),
            center_in_range: FuzzyFunction::trapezoid(0.0, 5.0, 25.0, 35.0),
            side_offset: FuzzyFunction::ramp(0.0, 5.0),
            center_stddev: FuzzyFunction::falling(2.0, 6.0),
            allow_partial_sides: true,
        }
    }
}

impl LineParams {
    pub fn validate(&self) -> ColideResult<()> {
        self.center_intensity.validate()?;
        self.center_in_range.validate()?;
        self.side_offset.validate()?;
        self.center_stddev.validate()
    }
}

/// Thin-line detector: owns its worker pool and offset table.
pub struct LineDetector {
    params: LineParams,
    orchestrator: RowOrchestrator<LineFamily>,
}

impl LineDetector {
    pub fn new(params: LineParams, threads: usize) -> ColideResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            orchestrator: RowOrchestrator::new(threads)?,
        })
    }

    pub fn params(&self) -> &LineParams {
        &self.params
    }

    pub fn set_params(&mut self, params: LineParams) -> ColideResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn orchestrator(&self) -> &RowOrchestrator<LineFamily> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RowOrchestrator<LineFamily> {
        &mut self.orchestrator
    }

    /// Best-fit line angle per pixel, or [`MISSING_ANGLE`].
    pub fn compute_direction(&mut self, input: &Grid, template: &TemplateSpec) -> ColideResult<Grid> {
        ensure_same_shape(input, &[])?;
        let params = &self.params;
        self.orchestrator
            .run_pass("direction", input, template, MISSING_ANGLE, |table| {
                LineDirectionScorer {
                    input,
                    table,
                    params,
                }
            })
    }

    /// Line interest in [0, 1] at the supplied directions, or [`MISSING_INTEREST`].
    pub fn compute_detection(
        &mut self,
        input: &Grid,
        direction: &Grid,
        template: &TemplateSpec,
    ) -> ColideResult<Grid> {
        ensure_same_shape(input, &[direction])?;
        let params = &self.params;
        self.orchestrator
            .run_pass("detection", input, template, MISSING_INTEREST, |table| {
                LineDetectionScorer {
                    input,
                    direction,
                    table,
                    params,
                }
            })
    }
}

/// One-shot direction pass.
pub fn compute_direction(
    input: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &LineParams,
) -> ColideResult<Grid> {
    LineDetector::new(params.clone(), threads)?
        .compute_direction(input, &TemplateSpec::new(length, width))
}

/// One-shot detection pass.
pub fn compute_detection(
    input: &Grid,
    direction: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &LineParams,
) -> ColideResult<Grid> {
    LineDetector::new(params.clone(), threads)?.compute_detection(
        input,
        direction,
        &TemplateSpec::new(length, width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ColideError;

    fn ridge(n: usize) -> Grid {
        Grid::from_fn(n, n, MISSING_INTEREST, |x, y| if x == y { 50.0 } else { 0.0 })
    }

    fn ridge_params() -> LineParams {
        LineParams {
            center_intensity: FuzzyFunction::ramp(13.0, 15.0),
            ..LineParams::default()
        }
    }

    #[test]
    fn table_is_reused_across_same_width_calls() {
        let grid = ridge(20);
        let template = TemplateSpec::new(5.0, 3.0);
        let mut detector = LineDetector::new(ridge_params(), 2).unwrap();
        detector.compute_direction(&grid, &template).unwrap();
        detector.compute_direction(&grid, &template).unwrap();
        assert_eq!(detector.orchestrator().table_rebuilds(), 1);
        detector.compute_direction(&ridge(24), &template).unwrap();
        assert_eq!(detector.orchestrator().table_rebuilds(), 2);
    }

    #[test]
    fn detection_scores_the_ridge() {
        let grid = ridge(20);
        let template = TemplateSpec::new(5.0, 3.0);
        let mut detector = LineDetector::new(ridge_params(), 1).unwrap();
        let direction = detector.compute_direction(&grid, &template).unwrap();
        let interest = detector
            .compute_detection(&grid, &direction, &template)
            .unwrap();
        let value = interest.get(10, 10).unwrap();
        assert!(value > 0.0 && value <= 1.0);
        assert_eq!(interest.get(12, 10), None);
    }

    #[test]
    fn mismatched_direction_grid_fails_before_dispatch() {
        let mut detector = LineDetector::new(LineParams::default(), 1).unwrap();
        let err = detector
            .compute_detection(&ridge(20), &ridge(21), &TemplateSpec::new(5.0, 3.0))
            .unwrap_err();
        assert!(matches!(err, ColideError::ShapeMismatch { .. }));
        assert_eq!(detector.orchestrator().metrics().rows, 0);
    }

    #[test]
    fn malformed_fuzzy_function_is_rejected() {
        let params = LineParams {
            side_offset: FuzzyFunction::ramp(5.0, 5.0),
            ..LineParams::default()
        };
        assert!(matches!(
            LineDetector::new(params, 1),
            Err(ColideError::InvalidConfig(_))
        ));
    }
}
