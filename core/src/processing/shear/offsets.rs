use crate::prelude::DetectorKind;
use crate::template::{Offsets, TemplateEntry, TemplateFamily, Window};

/// Sub-templates of one angle for radial shear detection: the two sides of
/// the template line, at base and double resolution.
#[derive(Debug, Clone)]
pub struct ShearEntry {
    pub angle: f32,
    pub left: Offsets,
    pub right: Offsets,
    pub left_fine: Offsets,
    pub right_fine: Offsets,
}

impl TemplateEntry for ShearEntry {
    fn angle(&self) -> f32 {
        self.angle
    }

    fn max_offset(&self) -> usize {
        [&self.left, &self.right, &self.left_fine, &self.right_fine]
            .iter()
            .map(|offsets| offsets.max_offset())
            .max()
            .unwrap_or(0)
    }
}

pub struct ShearFamily;

impl TemplateFamily for ShearFamily {
    type Entry = ShearEntry;
    const KIND: DetectorKind = DetectorKind::Shear;

    fn build_entry(window: &Window, index: usize, nx: usize) -> ShearEntry {
        let angle = window.ith_angle(index);
        let half_width = window.width() / 2.0;
        let coarse = window.positions();
        let fine = window.fine_positions();
        ShearEntry {
            angle,
            left: Offsets::along_line(angle, &coarse, half_width, nx),
            right: Offsets::along_line(angle, &coarse, -half_width, nx),
            left_fine: Offsets::along_line(angle, &fine, half_width, nx),
            right_fine: Offsets::along_line(angle, &fine, -half_width, nx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_template_has_left_toward_negative_x() {
        let window = Window::new(5.0, 3.0).unwrap();
        let entry = ShearFamily::build_entry(&window, 4, 32);
        assert_eq!(entry.angle, 90.0);
        assert!(entry.left.points().iter().all(|&(dx, _)| dx == -2));
        assert!(entry.right.points().iter().all(|&(dx, _)| dx == 2));
    }
}
