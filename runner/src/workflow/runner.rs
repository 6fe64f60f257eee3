use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use colidecore::grid::Grid;
use colidecore::math::StatsHelper;
use colidecore::prelude::{CancelToken, DetectorKind};
use colidecore::processing::{EllipseDetector, EnhanceDetector, LineDetector, ShearDetector};
use colidecore::telemetry::MetricsSnapshot;
use log::info;
use serde::Serialize;

/// Valid/missing breakdown of one output grid.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PassSummary {
    pub detector: DetectorKind,
    pub pass: String,
    pub valid: usize,
    pub missing: usize,
    pub mean: Option<f32>,
}

impl PassSummary {
    fn of(detector: DetectorKind, pass: &str, grid: &Grid) -> Self {
        let values: Vec<f32> = grid.valid_values().collect();
        Self {
            detector,
            pass: pass.to_string(),
            valid: values.len(),
            missing: grid.len() - values.len(),
            mean: StatsHelper::mean(&values),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorMetrics {
    pub detector: DetectorKind,
    pub table_rebuilds: usize,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub nx: usize,
    pub ny: usize,
    pub threads: usize,
    pub passes: Vec<PassSummary>,
    pub detectors: Vec<DetectorMetrics>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    cancel: CancelToken,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Token shared by every detector this runner builds.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn execute(&self, input: &Grid) -> anyhow::Result<WorkflowResult> {
        self.config.validate()?;
        let mut result = WorkflowResult {
            nx: input.nx(),
            ny: input.ny(),
            threads: self.config.threads,
            passes: Vec::new(),
            detectors: Vec::new(),
        };
        for &kind in &self.config.detectors {
            self.run_detector(kind, input, &mut result)
                .with_context(|| format!("running {} detector", kind))?;
        }
        Ok(result)
    }

    fn run_detector(&self, kind: DetectorKind, input: &Grid, result: &mut WorkflowResult) -> anyhow::Result<()> {
        let template = &self.config.template;
        let threads = self.config.threads;
        let mut record = |pass: &str, grid: &Grid| {
            let summary = PassSummary::of(kind, pass, grid);
            info!(
                "{} {}: {} valid, {} missing",
                kind, pass, summary.valid, summary.missing
            );
            result.passes.push(summary);
        };

        let (table_rebuilds, metrics) = match kind {
            DetectorKind::Line => {
                let mut detector = LineDetector::new(self.config.line.clone(), threads)?;
                detector.orchestrator_mut().set_cancel_token(self.cancel.clone());
                let direction = detector.compute_direction(input, template)?;
                record("direction", &direction);
                let detection = detector.compute_detection(input, &direction, template)?;
                record("detection", &detection);
                let orchestrator = detector.orchestrator();
                (orchestrator.table_rebuilds(), orchestrator.metrics())
            }
            DetectorKind::Shear => {
                let mut detector = ShearDetector::new(self.config.shear.clone(), threads)?;
                detector.orchestrator_mut().set_cancel_token(self.cancel.clone());
                let direction = detector.compute_direction(input, None, template)?;
                record("direction", &direction);
                let detection = detector.compute_detection(input, &direction, None, template)?;
                record("detection", &detection);
                let orchestrator = detector.orchestrator();
                (orchestrator.table_rebuilds(), orchestrator.metrics())
            }
            DetectorKind::Ellipse => {
                let mut detector = EllipseDetector::new(self.config.ellipse.clone(), threads)?;
                detector.orchestrator_mut().set_cancel_token(self.cancel.clone());
                let orientation = detector.compute_orientation(input, template)?;
                record("orientation", &orientation);
                let interest = detector.compute_interest(input, &orientation, template)?;
                record("interest", &interest);
                let confidence = detector.compute_confidence(input, &orientation, template)?;
                record("confidence", &confidence);
                let orchestrator = detector.orchestrator();
                (orchestrator.table_rebuilds(), orchestrator.metrics())
            }
            DetectorKind::Enhance => {
                let mut detector = EnhanceDetector::new(self.config.enhance.clone(), threads)?;
                detector.orchestrator_mut().set_cancel_token(self.cancel.clone());
                let (enhance, direction) = detector.compute_enhance_with_direction(input, template)?;
                record("enhance", &enhance);
                record("direction", &direction);
                let orchestrator = detector.orchestrator();
                (orchestrator.table_rebuilds(), orchestrator.metrics())
            }
        };
        result.detectors.push(DetectorMetrics {
            detector: kind,
            table_rebuilds,
            metrics,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scenario::{build_grid, ScenarioKind};
    use colidecore::template::TemplateSpec;

    fn config(kind: ScenarioKind) -> WorkflowConfig {
        WorkflowConfig::from_args(kind, 24, 20, TemplateSpec::new(5.0, 3.0), 2, 3)
    }

    #[test]
    fn runner_executes_every_detector() {
        let cfg = config(ScenarioKind::Speckle);
        let input = build_grid(&cfg.scenario).unwrap();
        let result = Runner::new(cfg).execute(&input).unwrap();
        assert_eq!(result.passes.len(), 2 + 2 + 3 + 2);
        assert_eq!(result.detectors.len(), 4);
        for summary in &result.passes {
            assert_eq!(summary.valid + summary.missing, 24 * 20);
        }
        for detector in &result.detectors {
            assert_eq!(detector.table_rebuilds, 1);
            assert_eq!(detector.metrics.rows, detector.metrics.passes * 20);
        }
    }

    #[test]
    fn constant_scenario_has_no_line_direction() {
        let mut cfg = config(ScenarioKind::Constant);
        cfg.detectors = vec![DetectorKind::Line];
        let input = build_grid(&cfg.scenario).unwrap();
        let result = Runner::new(cfg).execute(&input).unwrap();
        assert_eq!(result.passes[0].pass, "direction");
        assert_eq!(result.passes[0].valid, 0);
        assert_eq!(result.passes[0].mean, None);
    }

    #[test]
    fn cancelled_runner_fails_the_workflow() {
        let cfg = config(ScenarioKind::Ridge);
        let input = build_grid(&cfg.scenario).unwrap();
        let runner = Runner::new(cfg);
        runner.cancel_token().cancel();
        let err = runner.execute(&input).unwrap_err();
        assert!(format!("{:#}", err).contains("cancelled"));
    }
}
