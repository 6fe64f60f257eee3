//! Line enhancement.
//!
//! Each pixel takes the largest center-minus-sides contrast over all ladder
//! angles, passed through a fuzzy enhancement function. The winning angle,
//! turned by 90 degrees, is the orientation of the enhanced line.

mod offsets;
mod score;

pub use offsets::{EnhanceEntry, EnhanceFamily};
pub use score::{EnhanceOutput, EnhanceScorer};

use crate::grid::{Grid, MISSING_ANGLE, MISSING_INTEREST};
use crate::math::FuzzyFunction;
use crate::prelude::{ensure_same_shape, ColideError, ColideResult};
use crate::processing::orchestrator::RowOrchestrator;
use crate::template::TemplateSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// How far the pixel must exceed twice the brightest side sample before
    /// it is treated as a possible line end.
    pub min_end_difference: f32,
    /// Membership of the best center-minus-sides contrast.
    pub enhancement: FuzzyFunction,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            min_end_difference: 5.0,
            enhancement: FuzzyFunction::ramp(0.0, 10.0),
        }
    }
}

impl EnhanceParams {
    pub fn validate(&self) -> ColideResult<()> {
        if !self.min_end_difference.is_finite() {
            return Err(ColideError::InvalidConfig(
                "line-end difference must be finite".into(),
            ));
        }
        self.enhancement.validate()
    }
}

/// Line enhancement detector: owns its worker pool and offset table.
pub struct EnhanceDetector {
    params: EnhanceParams,
    orchestrator: RowOrchestrator<EnhanceFamily>,
}

impl EnhanceDetector {
    pub fn new(params: EnhanceParams, threads: usize) -> ColideResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            orchestrator: RowOrchestrator::new(threads)?,
        })
    }

    pub fn params(&self) -> &EnhanceParams {
        &self.params
    }

    pub fn set_params(&mut self, params: EnhanceParams) -> ColideResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn orchestrator(&self) -> &RowOrchestrator<EnhanceFamily> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RowOrchestrator<EnhanceFamily> {
        &mut self.orchestrator
    }

    /// The perpendicular of a ladder angle is itself on the ladder only when
    /// the angle count is even.
    fn check_template(template: &TemplateSpec) -> ColideResult<()> {
        let count = template.to_window()?.angle_count();
        if count % 2 != 0 {
            return Err(ColideError::InvalidTemplate(format!(
                "enhance needs an even angle count, got {}",
                count
            )));
        }
        Ok(())
    }

    fn run(&mut self, input: &Grid, template: &TemplateSpec, output: EnhanceOutput) -> ColideResult<Grid> {
        ensure_same_shape(input, &[])?;
        Self::check_template(template)?;
        let (pass, missing) = match output {
            EnhanceOutput::Value => ("enhance", MISSING_INTEREST),
            EnhanceOutput::Direction => ("direction", MISSING_ANGLE),
        };
        let params = &self.params;
        self.orchestrator
            .run_pass(pass, input, template, missing, |table| EnhanceScorer {
                input,
                table,
                params,
                output,
            })
    }

    /// Enhancement in [0, 1] per pixel, or [`MISSING_INTEREST`].
    pub fn compute_enhance(&mut self, input: &Grid, template: &TemplateSpec) -> ColideResult<Grid> {
        self.run(input, template, EnhanceOutput::Value)
    }

    /// Orientation of the enhanced line per pixel, or [`MISSING_ANGLE`].
    pub fn compute_enhance_direction(&mut self, input: &Grid, template: &TemplateSpec) -> ColideResult<Grid> {
        self.run(input, template, EnhanceOutput::Direction)
    }

    /// Both grids from one pass: each pixel's angle search fills its
    /// enhancement and its direction.
    pub fn compute_enhance_with_direction(
        &mut self,
        input: &Grid,
        template: &TemplateSpec,
    ) -> ColideResult<(Grid, Grid)> {
        ensure_same_shape(input, &[])?;
        Self::check_template(template)?;
        let params = &self.params;
        self.orchestrator.run_dual_pass(
            "enhance+direction",
            input,
            template,
            (MISSING_INTEREST, MISSING_ANGLE),
            |table| EnhanceScorer {
                input,
                table,
                params,
                output: EnhanceOutput::Value,
            },
        )
    }
}

/// One-shot enhancement pass.
pub fn compute_enhance(
    input: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &EnhanceParams,
) -> ColideResult<Grid> {
    EnhanceDetector::new(params.clone(), threads)?
        .compute_enhance(input, &TemplateSpec::new(length, width))
}

/// One-shot enhancement direction pass.
pub fn compute_enhance_direction(
    input: &Grid,
    length: f32,
    width: f32,
    threads: usize,
    params: &EnhanceParams,
) -> ColideResult<Grid> {
    EnhanceDetector::new(params.clone(), threads)?
        .compute_enhance_direction(input, &TemplateSpec::new(length, width))
}
