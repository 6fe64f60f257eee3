use crate::prelude::DetectorKind;
use crate::template::{Offsets, TemplateEntry, TemplateFamily, Window};

/// Sub-templates of one angle for thin-line detection.
#[derive(Debug, Clone)]
pub struct LineEntry {
    pub angle: f32,
    pub center: Offsets,
    pub left: Offsets,
    pub right: Offsets,
    pub left_fine: Offsets,
    pub right_fine: Offsets,
}

impl TemplateEntry for LineEntry {
    fn angle(&self) -> f32 {
        self.angle
    }

    fn max_offset(&self) -> usize {
        [
            &self.center,
            &self.left,
            &self.right,
            &self.left_fine,
            &self.right_fine,
        ]
        .iter()
        .map(|offsets| offsets.max_offset())
        .max()
        .unwrap_or(0)
    }
}

pub struct LineFamily;

impl TemplateFamily for LineFamily {
    type Entry = LineEntry;
    const KIND: DetectorKind = DetectorKind::Line;

    fn build_entry(window: &Window, index: usize, nx: usize) -> LineEntry {
        let angle = window.ith_angle(index);
        let half_width = window.width() / 2.0;
        let coarse = window.positions();
        let fine = window.fine_positions();
        LineEntry {
            angle,
            center: Offsets::along_line(angle, &coarse, 0.0, nx),
            left: Offsets::along_line(angle, &coarse, half_width, nx),
            right: Offsets::along_line(angle, &coarse, -half_width, nx),
            left_fine: Offsets::along_line(angle, &fine, half_width, nx),
            right_fine: Offsets::along_line(angle, &fine, -half_width, nx),
        }
    }
}
