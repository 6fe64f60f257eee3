use super::offsets::Offsets;
use super::window::Window;
use crate::prelude::{ColideError, ColideResult, DetectorKind};
use log::debug;

/// One angle's sub-templates.
pub trait TemplateEntry: Send + Sync {
    fn angle(&self) -> f32;
    fn max_offset(&self) -> usize;
}

/// A detector family's offset-table builder.
pub trait TemplateFamily {
    type Entry: TemplateEntry;
    const KIND: DetectorKind;

    fn build_entry(window: &Window, index: usize, nx: usize) -> Self::Entry;
}

/// Per-angle sub-templates of one family, bound to a grid width.
pub struct OffsetTable<F: TemplateFamily> {
    window: Window,
    nx: usize,
    entries: Vec<F::Entry>,
    neighborhood: Offsets,
    max_offset: usize,
}

impl<F: TemplateFamily> OffsetTable<F> {
    pub fn build(window: Window, nx: usize) -> Self {
        let entries: Vec<F::Entry> = (0..window.angle_count())
            .map(|i| F::build_entry(&window, i, nx))
            .collect();
        let neighborhood = Offsets::neighborhood(1, nx);
        let max_offset = entries
            .iter()
            .map(TemplateEntry::max_offset)
            .max()
            .unwrap_or(0)
            .max(neighborhood.max_offset());
        Self {
            window,
            nx,
            entries,
            neighborhood,
            max_offset,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn bound_width(&self) -> usize {
        self.nx
    }

    pub fn entries(&self) -> &[F::Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&F::Entry> {
        self.entries.get(index)
    }

    /// Fixed 3x3 neighborhood used by the pre-checks.
    pub fn neighborhood(&self) -> &Offsets {
        &self.neighborhood
    }

    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    pub fn matches(&self, nx: usize, window: &Window) -> bool {
        self.nx == nx && self.window == *window
    }

    pub fn ensure_bound_to(&self, nx: usize) -> ColideResult<()> {
        if self.nx != nx {
            return Err(ColideError::StaleOffsetTable {
                table_nx: self.nx,
                grid_nx: nx,
            });
        }
        Ok(())
    }

    /// True when any template sample at `(x, y)` could fall off the grid.
    pub fn out_of_range(&self, x: usize, y: usize, ny: usize) -> bool {
        let m = self.max_offset;
        x < m || y < m || x + m >= self.nx || y + m >= ny
    }

    /// Index of the ladder angle exactly equal to `angle`.
    pub fn angle_index(&self, angle: f32) -> Option<usize> {
        self.entries.iter().position(|entry| entry.angle() == angle)
    }

    /// Entry whose angle exactly equals `angle`. Angles written by a
    /// direction pass come from this same ladder, so equality is safe.
    pub fn lookup(&self, angle: f32) -> Option<&F::Entry> {
        self.angle_index(angle).and_then(|i| self.entries.get(i))
    }
}

/// Owns the cached table of one orchestrator.
pub struct TableCache<F: TemplateFamily> {
    table: Option<OffsetTable<F>>,
    rebuilds: usize,
}

impl<F: TemplateFamily> TableCache<F> {
    pub fn new() -> Self {
        Self {
            table: None,
            rebuilds: 0,
        }
    }

    /// Returns a table for `nx` and `window`, rebuilding when either changed
    /// since the previous call.
    pub fn rebuild_if_needed(&mut self, nx: usize, window: Window) -> &OffsetTable<F> {
        let stale = !matches!(&self.table, Some(table) if table.matches(nx, &window));
        if stale {
            debug!(
                "[{}] building offset table: nx={} length={} width={} angles={}",
                F::KIND,
                nx,
                window.length(),
                window.width(),
                window.angle_count()
            );
            self.rebuilds += 1;
            self.table = Some(OffsetTable::build(window, nx));
        }
        self.table.get_or_insert_with(|| OffsetTable::build(window, nx))
    }

    pub fn current(&self) -> Option<&OffsetTable<F>> {
        self.table.as_ref()
    }

    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    pub fn clear(&mut self) {
        self.table = None;
    }
}

impl<F: TemplateFamily> Default for TableCache<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Center;

    struct CenterEntry {
        angle: f32,
        center: Offsets,
    }

    impl TemplateEntry for CenterEntry {
        fn angle(&self) -> f32 {
            self.angle
        }

        fn max_offset(&self) -> usize {
            self.center.max_offset()
        }
    }

    impl TemplateFamily for Center {
        type Entry = CenterEntry;
        const KIND: DetectorKind = DetectorKind::Line;

        fn build_entry(window: &Window, index: usize, nx: usize) -> CenterEntry {
            let angle = window.ith_angle(index);
            CenterEntry {
                angle,
                center: Offsets::along_line(angle, &window.positions(), 0.0, nx),
            }
        }
    }

    #[test]
    fn every_ladder_angle_is_found_by_exact_lookup() {
        let window = Window::new(9.0, 2.0).unwrap();
        let table: OffsetTable<Center> = OffsetTable::build(window, 40);
        for i in 0..window.angle_count() {
            let angle = window.ith_angle(i);
            assert_eq!(table.angle_index(angle), Some(i));
        }
        assert!(table.lookup(1.0e-3).is_none());
    }

    #[test]
    fn border_pixels_are_out_of_range() {
        let window = Window::new(5.0, 3.0).unwrap();
        let table: OffsetTable<Center> = OffsetTable::build(window, 20);
        let m = table.max_offset();
        assert_eq!(m, 2);
        assert!(table.out_of_range(m - 1, 10, 20));
        assert!(table.out_of_range(10, 20 - m, 20));
        assert!(!table.out_of_range(m, m, 20));
    }

    #[test]
    fn cache_rebuilds_only_on_width_or_window_change() {
        let window = Window::new(5.0, 3.0).unwrap();
        let mut cache: TableCache<Center> = TableCache::new();
        cache.rebuild_if_needed(32, window);
        cache.rebuild_if_needed(32, window);
        assert_eq!(cache.rebuilds(), 1);
        cache.rebuild_if_needed(48, window);
        assert_eq!(cache.rebuilds(), 2);
        let wider = Window::new(5.0, 4.0).unwrap();
        let table = cache.rebuild_if_needed(48, wider);
        assert_eq!(table.window(), &wider);
        assert_eq!(cache.rebuilds(), 3);
    }

    #[test]
    fn stale_width_fails_loudly() {
        let window = Window::new(5.0, 3.0).unwrap();
        let table: OffsetTable<Center> = OffsetTable::build(window, 32);
        assert_eq!(
            table.ensure_bound_to(33),
            Err(ColideError::StaleOffsetTable {
                table_nx: 32,
                grid_nx: 33
            })
        );
        assert!(table.ensure_bound_to(32).is_ok());
    }
}
