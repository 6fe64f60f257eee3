//! Radial shear detection on velocity-like fields.
//!
//! The direction pass keeps the angle whose two template sides differ the
//! most. The detection pass checks that the template is radially aligned
//! with the radar and that the observed shear has the configured sense
//! (convergent or divergent) before scoring it.

mod offsets;
mod score;

pub use offsets::{ShearEntry, ShearFamily};
pub use score::{outer_side, OuterSide, ShearDetectionScorer, ShearDirectionScorer};

use crate::grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
use crate::math::FuzzyFunction;
use crate::prelude::{ensure_same_shape, ColideError, ColideResult};
use crate::processing::orchestrator::RowOrchestrator;
use crate::template::TemplateSpec;
use serde::{Deserialize, Serialize};

/// Closed interval of acceptable values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn validate(&self, name: &str) -> ColideResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.max < self.min {
            return Err(ColideError::InvalidConfig(format!(
                "{} range [{}, {}] is empty or not finite",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShearParams {
    /// Smallest side difference accepted by the direction pass.
    pub min_shear: f32,
    /// When set, the 3x3 maximum of the secondary field must lie inside.
    pub secondary_gate: Option<ValueRange>,
    /// Expect the side nearer the radar to exceed the farther side.
    pub is_convergent: bool,
    /// Tolerance, in degrees, for radial alignment of the template.
    pub cut_angle: f32,
    /// Radar position in grid coordinates.
    pub radar_x: f32,
    pub radar_y: f32,
    /// Membership of `larger side sample - mean of both sides`.
    pub side_vs_mean: FuzzyFunction,
}

impl Default for ShearParams {
    fn default() -> Self {
        Self {
            min_shear: 5.0,
            secondary_gate: None,
            is_convergent: true,
            cut_angle: 45.0,
            radar_x: 0.0,
            radar_y: 0.0,
            side_vs_mean: FuzzyFunction::ramp(0.0, 10.0),
        }
    }
}

impl ShearParams {
    pub fn validate(&self) -> ColideResult<()> {
        if !self.min_shear.is_finite() || self.min_shear < 0.0 {
            return Err(ColideError::InvalidConfig(format!(
                "shear minimum must be a non-negative number, got {}",
                self.min_shear
            )));
        }
        if !(0.0..=90.0).contains(&self.cut_angle) {
            return Err(ColideError::InvalidConfig(format!(
                "cut angle {} outside [0, 90]",
                self.cut_angle
            )));
        }
        if !(self.radar_x.is_finite() && self.radar_y.is_finite()) {
            return Err(ColideError::InvalidConfig(
                "radar position must be finite".into(),
            ));
        }
        if let Some(gate) = &self.secondary_gate {
            gate.validate("secondary gate")?;
        }
        self.side_vs_mean.validate()
    }
}

/// Radial shear detector: owns its worker pool and offset table.
pub struct ShearDetector {
    params: ShearParams,
    orchestrator: RowOrchestrator<ShearFamily>,
}

impl ShearDetector {
    pub fn new(params: ShearParams, threads: usize) -> ColideResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            orchestrator: RowOrchestrator::new(threads)?,
        })
    }

    pub fn params(&self) -> &ShearParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ShearParams) -> ColideResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn orchestrator(&self) -> &RowOrchestrator<ShearFamily> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RowOrchestrator<ShearFamily> {
        &mut self.orchestrator
    }

    /// Angle of strongest shear per pixel, or [`MISSING_ANGLE`].
    pub fn compute_direction(
        &mut self,
        input: &Grid,
        secondary: Option<&Grid>,
        template: &TemplateSpec,
    ) -> ColideResult<Grid> {
        let others: Vec<&Grid> = secondary.into_iter().collect();
        ensure_same_shape(input, &others)?;
        let params = &self.params;
        self.orchestrator
            .run_pass("direction", input, template, MISSING_ANGLE, |table| {
                ShearDirectionScorer {
                    input,
                    secondary,
                    table,
                    params,
                }
            })
    }

    /// Shear interest in [0, 1] at the supplied directions, or [`MISSING_INTEREST`].
    pub fn compute_detection(
        &mut self,
        input: &Grid,
        direction: &Grid,
        secondary: Option<&Grid>,
        template: &TemplateSpec,
    ) -> ColideResult<Grid> {
        let mut others = vec![direction];
        others.extend(secondary);
        ensure_same_shape(input, &others)?;
        let params = &self.params;
        self.orchestrator
            .run_pass("detection", input, template, MISSING_INTEREST, |table| {
                ShearDetectionScorer {
                    input,
                    direction,
                    secondary,
                    table,
                    params,
                }
            })
    }
}

/// One-shot direction pass.
pub fn compute_direction(
    input: &Grid,
    secondary: Option<&Grid>,
    length: f32,
    width: f32,
    threads: usize,
    params: &ShearParams,
) -> ColideResult<Grid> {
    ShearDetector::new(params.clone(), threads)?.compute_direction(
        input,
        secondary,
        &TemplateSpec::new(length, width),
    )
}

/// One-shot detection pass.
pub fn compute_detection(
    input: &Grid,
    direction: &Grid,
    secondary: Option<&Grid>,
    length: f32,
    width: f32,
    threads: usize,
    params: &ShearParams,
) -> ColideResult<Grid> {
    ShearDetector::new(params.clone(), threads)?.compute_detection(
        input,
        direction,
        secondary,
        &TemplateSpec::new(length, width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: usize) -> Grid {
        Grid::from_fn(n, n, MISSING_INTEREST, |x, _| if x < n / 2 { 10.0 } else { -10.0 })
    }

    #[test]
    fn inverted_gate_is_a_configuration_error() {
        let params = ShearParams {
            secondary_gate: Some(ValueRange::new(30.0, 10.0)),
            ..ShearParams::default()
        };
        assert!(matches!(
            ShearDetector::new(params, 1),
            Err(ColideError::InvalidConfig(_))
        ));
    }

    #[test]
    fn out_of_range_cut_angle_is_rejected() {
        let params = ShearParams {
            cut_angle: 120.0,
            ..ShearParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn secondary_gate_masks_direction() {
        let grid = step(21);
        let secondary = Grid::from_fn(21, 21, MISSING_INTEREST, |_, y| if y < 10 { 40.0 } else { 5.0 });
        let params = ShearParams {
            secondary_gate: Some(ValueRange::new(20.0, 60.0)),
            ..ShearParams::default()
        };
        let mut detector = ShearDetector::new(params, 2).unwrap();
        let template = TemplateSpec::new(5.0, 3.0);
        let direction = detector
            .compute_direction(&grid, Some(&secondary), &template)
            .unwrap();
        assert_eq!(direction.get(10, 5), Some(90.0));
        assert_eq!(direction.get(10, 15), None);
        let ungated = detector.compute_direction(&grid, None, &template).unwrap();
        assert_eq!(ungated.get(10, 15), Some(90.0));
    }

    #[test]
    fn flat_field_has_no_shear_direction() {
        let grid = Grid::from_fn(16, 16, MISSING_INTEREST, |_, _| 3.0);
        let direction = compute_direction(&grid, None, 5.0, 3.0, 1, &ShearParams::default()).unwrap();
        assert_eq!(direction.valid_count(), 0);
    }
}
