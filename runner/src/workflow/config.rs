use crate::generator::scenario::{ScenarioConfig, ScenarioKind};
use anyhow::{bail, Context};
use colidecore::prelude::DetectorKind;
use colidecore::processing::{EllipseParams, EnhanceParams, LineParams, ShearParams};
use colidecore::template::TemplateSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub scenario: ScenarioConfig,
    pub template: TemplateSpec,
    pub threads: usize,
    /// Detector families to run, in order.
    pub detectors: Vec<DetectorKind>,
    pub line: LineParams,
    pub shear: ShearParams,
    pub ellipse: EllipseParams,
    pub enhance: EnhanceParams,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioConfig::default(),
            template: TemplateSpec::default(),
            threads: 4,
            detectors: vec![
                DetectorKind::Line,
                DetectorKind::Shear,
                DetectorKind::Ellipse,
                DetectorKind::Enhance,
            ],
            line: LineParams::default(),
            shear: ShearParams::default(),
            ellipse: EllipseParams::default(),
            enhance: EnhanceParams::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Builds a config from command-line values. For the shear step the
    /// radar sits left of the grid, level with its middle row, so the step
    /// is radially aligned.
    pub fn from_args(
        kind: ScenarioKind,
        nx: usize,
        ny: usize,
        template: TemplateSpec,
        threads: usize,
        seed: u64,
    ) -> Self {
        let mut config = Self {
            scenario: ScenarioConfig {
                kind,
                nx,
                ny,
                seed,
                ..ScenarioConfig::default()
            },
            template,
            threads,
            ..Self::default()
        };
        if kind == ScenarioKind::ShearStep {
            config.shear.radar_x = -(nx as f32);
            config.shear.radar_y = ny as f32 / 2.0;
        }
        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == 0 {
            bail!("thread count must be at least 1");
        }
        if self.detectors.is_empty() {
            bail!("no detectors selected");
        }
        self.template.to_window()?;
        self.line.validate()?;
        self.shear.validate()?;
        self.ellipse.validate()?;
        self.enhance.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colidecore::processing::EllipseMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn shear_step_places_the_radar_on_the_middle_row() {
        let cfg = WorkflowConfig::from_args(
            ScenarioKind::ShearStep,
            40,
            30,
            TemplateSpec::new(5.0, 3.0),
            2,
            0,
        );
        assert_eq!(cfg.shear.radar_x, -40.0);
        assert_eq!(cfg.shear.radar_y, 15.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"scenario:\n  kind: ridge\n  nx: 20\n  ny: 20\n\
template:\n  length: 7.0\n  width: 2.0\n\
threads: 2\n\
detectors: [line, ellipse]\n\
ellipse:\n  mode: min_variance\n\
line:\n  center_intensity: [[13.0, 0.0], [15.0, 1.0]]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.scenario.kind, ScenarioKind::Ridge);
        assert_eq!(cfg.template.length, 7.0);
        assert_eq!(cfg.detectors, vec![DetectorKind::Line, DetectorKind::Ellipse]);
        assert_eq!(cfg.ellipse.mode, EllipseMode::MinVariance);
        assert_eq!(cfg.line.center_intensity.apply(14.0), 0.5);
        assert_eq!(cfg.shear, ShearParams::default());
    }

    #[test]
    fn config_load_rejects_invalid_parameters() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"threads: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
