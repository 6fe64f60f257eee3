use crate::prelude::DetectorKind;
use crate::template::{Offsets, TemplateEntry, TemplateFamily, Window};

/// The full rotated rectangle of one angle, plus its two halves along the
/// template axis.
#[derive(Debug, Clone)]
pub struct EllipseEntry {
    pub angle: f32,
    pub window: Offsets,
    pub forward: Offsets,
    pub backward: Offsets,
}

impl TemplateEntry for EllipseEntry {
    fn angle(&self) -> f32 {
        self.angle
    }

    fn max_offset(&self) -> usize {
        self.window.max_offset()
    }
}

pub struct EllipseFamily;

impl TemplateFamily for EllipseFamily {
    type Entry = EllipseEntry;
    const KIND: DetectorKind = DetectorKind::Ellipse;

    fn build_entry(window: &Window, index: usize, nx: usize) -> EllipseEntry {
        let angle = window.ith_angle(index);
        let rectangle = Offsets::rectangle(
            angle,
            &window.positions(),
            &window.lateral_positions(),
            nx,
        );
        let (forward, backward) = rectangle.split_halves();
        EllipseEntry {
            angle,
            window: rectangle,
            forward,
            backward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_rectangle_splits_at_center_column() {
        let window = Window::new(5.0, 3.0).unwrap();
        let entry = EllipseFamily::build_entry(&window, 0, 64);
        assert_eq!(entry.window.len(), 15);
        assert_eq!(entry.forward.len(), 6);
        assert_eq!(entry.backward.len(), 6);
        assert!(entry.forward.points().iter().all(|&(dx, _)| dx > 0));
        assert!(entry.backward.points().iter().all(|&(dx, _)| dx < 0));
    }
}
