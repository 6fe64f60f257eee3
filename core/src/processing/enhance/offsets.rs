use crate::prelude::DetectorKind;
use crate::template::{Offsets, TemplateEntry, TemplateFamily, Window};

/// Center line of one angle with its two halves, and the two sides at
/// half the template width.
#[derive(Debug, Clone)]
pub struct EnhanceEntry {
    pub angle: f32,
    pub center: Offsets,
    pub center_forward: Offsets,
    pub center_backward: Offsets,
    pub left: Offsets,
    pub right: Offsets,
}

impl TemplateEntry for EnhanceEntry {
    fn angle(&self) -> f32 {
        self.angle
    }

    fn max_offset(&self) -> usize {
        [&self.center, &self.left, &self.right]
            .iter()
            .map(|offsets| offsets.max_offset())
            .max()
            .unwrap_or(0)
    }
}

pub struct EnhanceFamily;

impl TemplateFamily for EnhanceFamily {
    type Entry = EnhanceEntry;
    const KIND: DetectorKind = DetectorKind::Enhance;

    fn build_entry(window: &Window, index: usize, nx: usize) -> EnhanceEntry {
        let angle = window.ith_angle(index);
        let half_width = window.width() / 2.0;
        let positions = window.positions();
        let center = Offsets::along_line(angle, &positions, 0.0, nx);
        let (center_forward, center_backward) = center.split_halves();
        EnhanceEntry {
            angle,
            center,
            center_forward,
            center_backward,
            left: Offsets::along_line(angle, &positions, half_width, nx),
            right: Offsets::along_line(angle, &positions, -half_width, nx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_halves_exclude_the_pixel_itself() {
        let window = Window::new(5.0, 3.0).unwrap();
        let entry = EnhanceFamily::build_entry(&window, 0, 32);
        assert_eq!(entry.center.len(), 5);
        assert_eq!(entry.center_forward.points(), &[(1, 0), (2, 0)]);
        assert_eq!(entry.center_backward.points(), &[(-2, 0), (-1, 0)]);
        assert_eq!(entry.max_offset(), 2);
    }
}
