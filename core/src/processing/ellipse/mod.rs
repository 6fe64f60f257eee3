//! Elliptical orientation, interest and confidence.
//!
//! The orientation pass picks the angle at which a rotated rectangular
//! window has the extreme average or variance. Interest recomputes that
//! statistic at the chosen angle; confidence measures how much of the window
//! ahead of and behind the pixel holds valid data.

mod offsets;
mod score;

pub use offsets::{EllipseEntry, EllipseFamily};
pub use score::{EllipseConfidenceScorer, EllipseInterestScorer, EllipseOrientationScorer};

use crate::grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
use crate::math::FuzzyFunction;
use crate::prelude::{ensure_same_shape, ColideError, ColideResult};
use crate::processing::orchestrator::RowOrchestrator;
use crate::template::TemplateSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipseMode {
    MaxAverage,
    MinVariance,
    MaxVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EllipseParams {
    pub mode: EllipseMode,
    /// The 3x3 maximum must reach this value for a pixel to be oriented.
    pub smooth_threshold: f32,
    /// Fraction of window samples that must be valid.
    pub min_valid_fraction: f32,
    /// Membership of the mean valid fraction of the two template halves.
    pub confidence: FuzzyFunction,
}

impl Default for EllipseParams {
    fn default() -> Self {
        Self {
            mode: EllipseMode::MaxAverage,
            smooth_threshold: 0.0,
            min_valid_fraction: 0.5,
            confidence: FuzzyFunction::ramp(0.3, 0.9),
        }
    }
}

impl EllipseParams {
    pub fn validate(&self) -> ColideResult<()> {
        if !self.smooth_threshold.is_finite() {
            return Err(ColideError::InvalidConfig(
                "smoothing threshold must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_valid_fraction) {
            return Err(ColideError::InvalidConfig(format!(
                "minimum valid fraction {} outside [0, 1]",
                self.min_valid_fraction
            )));
        }
        self.confidence.validate()
    }
}

/// Elliptical orientation detector: owns its worker pool and offset table.
pub struct EllipseDetector {
    params: EllipseParams,
    orchestrator: RowOrchestrator<EllipseFamily>,
}

impl EllipseDetector {
    pub fn new(params: EllipseParams, threads: usize) -> ColideResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            orchestrator: RowOrchestrator::new(threads)?,
        })
    }

    pub fn params(&self) -> &EllipseParams {
        &self.params
    }

    pub fn set_params(&mut self, params: EllipseParams) -> ColideResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn orchestrator(&self) -> &RowOrchestrator<EllipseFamily> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RowOrchestrator<EllipseFamily> {
        &mut self.orchestrator
    }

    /// Orientation angle per pixel, or [`MISSING_ANGLE`].
    pub fn compute_orientation(&mut self, input: &Grid, template: &TemplateSpec) -> ColideResult<Grid> {
        ensure_same_shape(input, &[])?;
        let params = &self.params;
        self.orchestrator
            .run_pass("orientation", input, template, MISSING_ANGLE, |table| {
                EllipseOrientationScorer {
                    input,
                    table,
                    params,
                }
            })
    }

    /// Window statistic at the supplied orientation, in input units; missing
    /// cells carry the input grid's missing value.
    pub fn compute_interest(
        &mut self,
        input: &Grid,
        orientation: &Grid,
        template: &TemplateSpec,
    ) -> ColideResult<Grid> {
        ensure_same_shape(input, &[orientation])?;
        let params = &self.params;
        self.orchestrator
            .run_pass("interest", input, template, input.missing(), |table| {
                EllipseInterestScorer {
                    input,
                    orientation,
                    table,
                    params,
                }
            })
    }

    /// Confidence in [0, 1] at the supplied orientation, or [`MISSING_INTEREST`].
    pub fn compute_confidence(
        &mut self,
        input: &Grid,
        orientation: &Grid,
        template: &TemplateSpec,
    ) -> ColideResult<Grid> {
        ensure_same_shape(input, &[orientation])?;
        let params = &self.params;
        self.orchestrator
            .run_pass("confidence", input, template, MISSING_INTEREST, |table| {
                EllipseConfidenceScorer {
                    input,
                    orientation,
                    table,
                    params,
                }
            })
    }
}

/// One-shot orientation pass.
pub fn compute_orientation(
    input: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &EllipseParams,
) -> ColideResult<Grid> {
    EllipseDetector::new(params.clone(), threads)?
        .compute_orientation(input, &TemplateSpec::new(length, width))
}

/// One-shot interest pass.
pub fn compute_interest(
    input: &Grid,
    orientation: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &EllipseParams,
) -> ColideResult<Grid> {
    EllipseDetector::new(params.clone(), threads)?.compute_interest(
        input,
        orientation,
        &TemplateSpec::new(length, width),
    )
}

/// One-shot confidence pass.
pub fn compute_confidence(
    input: &Grid,
    orientation: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &EllipseParams,
) -> ColideResult<Grid> {
    EllipseDetector::new(params.clone(), threads)?.compute_confidence(
        input,
        orientation,
        &TemplateSpec::new(length, width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn band(n: usize) -> Grid {
        Grid::from_fn(n, n, -32.0, |x, _| if x == n / 2 { 40.0 } else { 10.0 })
    }

    #[test]
    fn average_mode_follows_a_bright_band() {
        let grid = band(21);
        let template = TemplateSpec::new(7.0, 2.0);
        let mut detector = EllipseDetector::new(EllipseParams::default(), 2).unwrap();
        let orientation = detector.compute_orientation(&grid, &template).unwrap();
        assert_eq!(orientation.get(10, 10), Some(90.0));

        let interest = detector
            .compute_interest(&grid, &orientation, &template)
            .unwrap();
        assert_eq!(interest.missing(), -32.0);
        assert!(interest.get(10, 10).unwrap() > 10.0);

        let confidence = detector
            .compute_confidence(&grid, &orientation, &template)
            .unwrap();
        assert_abs_diff_eq!(confidence.get(10, 10).unwrap(), 1.0);
        assert_eq!(detector.orchestrator().table_rebuilds(), 1);
    }

    #[test]
    fn smoothing_threshold_skips_weak_pixels() {
        let grid = band(21);
        let params = EllipseParams {
            smooth_threshold: 35.0,
            ..EllipseParams::default()
        };
        let orientation = compute_orientation(&grid, 7.0, 2.0, 1, &params).unwrap();
        assert!(orientation.get(10, 10).is_some());
        assert_eq!(orientation.get(5, 10), None);
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected() {
        let params = EllipseParams {
            min_valid_fraction: 1.5,
            ..EllipseParams::default()
        };
        assert!(EllipseDetector::new(params, 1).is_err());
    }
}
