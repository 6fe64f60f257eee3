use crate::prelude::{ColideError, ColideResult};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Upper bound on samples along one template line.
pub const MAX_SAMPLES: usize = 21;
/// Smallest spacing between samples, in cells.
pub const MIN_STEP: f32 = 1.2;
/// Upper bound on the derived angle count.
pub const MAX_ANGLES: usize = 16;
/// Upper bound accepted by [`Window::with_angle_count`].
pub const MAX_EXPLICIT_ANGLES: usize = 4 * MAX_ANGLES;
/// Largest template length or width, in cells.
pub const MAX_EXTENT: f32 = 512.0;

/// Geometry of a rectangular template rotated through `angle_count` evenly
/// spaced angles in [0, 180).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    length: f32,
    width: f32,
    angle_count: usize,
    step: f32,
    sample_count: usize,
}

impl Window {
    /// Derives the angle count from the template aspect ratio. The count is
    /// rounded up to a multiple of four so the ladder always holds the axes
    /// and both diagonals.
    pub fn new(length: f32, width: f32) -> ColideResult<Self> {
        check_extent(length, width)?;
        let raw = (PI / (width / length).atan()).ceil();
        let raw = if raw.is_finite() {
            raw as usize
        } else {
            MAX_ANGLES
        };
        let angle_count = raw.div_ceil(4).saturating_mul(4).clamp(4, MAX_ANGLES);
        Ok(Self::build(length, width, angle_count))
    }

    pub fn with_angle_count(length: f32, width: f32, angle_count: usize) -> ColideResult<Self> {
        check_extent(length, width)?;
        if angle_count == 0 || angle_count > MAX_EXPLICIT_ANGLES {
            return Err(ColideError::InvalidTemplate(format!(
                "angle count {} outside 1..={}",
                angle_count, MAX_EXPLICIT_ANGLES
            )));
        }
        Ok(Self::build(length, width, angle_count))
    }

    fn build(length: f32, width: f32, angle_count: usize) -> Self {
        let step = (length / (MAX_SAMPLES - 1) as f32).max(MIN_STEP);
        let mut sample_count = ((length / step).floor() as usize + 1).min(MAX_SAMPLES);
        if sample_count % 2 == 0 {
            sample_count -= 1;
        }
        Self {
            length,
            width,
            angle_count,
            step,
            sample_count,
        }
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn angle_count(&self) -> usize {
        self.angle_count
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn ith_angle(&self, i: usize) -> f32 {
        180.0 * i as f32 / self.angle_count as f32
    }

    pub fn angles(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.angle_count).map(move |i| self.ith_angle(i))
    }

    /// Positions along the template axis, centered on zero, at the base step.
    pub fn positions(&self) -> Vec<f32> {
        centered_positions(self.step, self.sample_count)
    }

    /// Positions at double resolution spanning the same extent.
    pub fn fine_positions(&self) -> Vec<f32> {
        centered_positions(self.step / 2.0, 2 * self.sample_count - 1)
    }

    /// Lateral positions spanning the width, always including the center
    /// line. Wide templates are sampled more coarsely so there are never
    /// more than [`MAX_SAMPLES`] lateral lines.
    pub fn lateral_positions(&self) -> Vec<f32> {
        let step = (self.width / (MAX_SAMPLES - 1) as f32).max(self.step);
        let per_side = ((self.width / 2.0 / step + 1.0e-4).floor() as usize).min(MAX_SAMPLES / 2);
        centered_positions(step, 2 * per_side + 1)
    }
}

fn check_extent(length: f32, width: f32) -> ColideResult<()> {
    for (name, extent) in [("length", length), ("width", width)] {
        if !(extent.is_finite() && extent > 0.0) {
            return Err(ColideError::InvalidTemplate(format!(
                "template {} must be positive, got {}",
                name, extent
            )));
        }
        if extent > MAX_EXTENT {
            return Err(ColideError::InvalidTemplate(format!(
                "template {} {} exceeds {} cells",
                name, extent, MAX_EXTENT
            )));
        }
    }
    Ok(())
}

fn centered_positions(step: f32, count: usize) -> Vec<f32> {
    let half = (count as f32 - 1.0) / 2.0;
    (0..count).map(|k| (k as f32 - half) * step).collect()
}

/// Serializable template request; `angle_count` overrides the derived count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    pub length: f32,
    pub width: f32,
    pub angle_count: Option<usize>,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            length: 5.0,
            width: 3.0,
            angle_count: None,
        }
    }
}

impl TemplateSpec {
    pub fn new(length: f32, width: f32) -> Self {
        Self {
            length,
            width,
            angle_count: None,
        }
    }

    pub fn to_window(&self) -> ColideResult<Window> {
        match self.angle_count {
            Some(count) => Window::with_angle_count(self.length, self.width, count),
            None => Window::new(self.length, self.width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn short_template_uses_minimum_step() {
        let window = Window::new(5.0, 3.0).unwrap();
        assert_abs_diff_eq!(window.step(), MIN_STEP);
        assert_eq!(window.sample_count(), 5);
        assert_eq!(window.angle_count(), 8);
    }

    #[test]
    fn long_template_caps_samples_and_angles() {
        let window = Window::new(60.0, 2.0).unwrap();
        assert_abs_diff_eq!(window.step(), 3.0);
        assert_eq!(window.sample_count(), MAX_SAMPLES);
        assert_eq!(window.angle_count(), MAX_ANGLES);
    }

    #[test]
    fn ladder_is_evenly_spaced_below_half_turn() {
        let window = Window::with_angle_count(5.0, 3.0, 6).unwrap();
        let angles: Vec<f32> = window.angles().collect();
        assert_eq!(angles, vec![0.0, 30.0, 60.0, 90.0, 120.0, 150.0]);
    }

    #[test]
    fn positions_are_centered() {
        let window = Window::new(5.0, 3.0).unwrap();
        let positions = window.positions();
        assert_abs_diff_eq!(positions[0], -2.4, epsilon = 1e-5);
        assert_abs_diff_eq!(positions[2], 0.0);
        assert_eq!(window.fine_positions().len(), 9);
        assert_eq!(window.lateral_positions().len(), 3);
    }

    #[test]
    fn sample_count_is_odd_so_the_center_is_sampled() {
        let window = Window::new(7.0, 2.0).unwrap();
        assert_eq!(window.sample_count(), 5);
        assert!(window.positions().contains(&0.0));
        assert_eq!(window.lateral_positions(), vec![0.0]);
    }

    #[test]
    fn zero_sized_templates_are_rejected() {
        assert!(matches!(
            Window::new(0.0, 3.0),
            Err(ColideError::InvalidTemplate(_))
        ));
        assert!(Window::new(5.0, 0.0).is_err());
        assert!(Window::with_angle_count(5.0, 3.0, 0).is_err());
        assert!(Window::new(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn oversized_templates_are_rejected() {
        for (length, width) in [(1.0e20, 3.0), (5.0, 1.0e30), (MAX_EXTENT + 1.0, 3.0)] {
            assert!(matches!(
                Window::new(length, width),
                Err(ColideError::InvalidTemplate(_))
            ));
            assert!(Window::with_angle_count(length, width, 8).is_err());
        }
        assert!(Window::new(MAX_EXTENT, MAX_EXTENT).is_ok());
    }

    #[test]
    fn wide_templates_cap_lateral_lines() {
        let window = Window::new(5.0, MAX_EXTENT).unwrap();
        let laterals = window.lateral_positions();
        assert_eq!(laterals.len(), MAX_SAMPLES);
        assert_abs_diff_eq!(laterals[0], -MAX_EXTENT / 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(laterals[MAX_SAMPLES / 2], 0.0);
    }
}
