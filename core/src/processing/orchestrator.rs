use crate::grid::Grid;
use crate::prelude::{ColideResult, DualScorer, PixelScorer};
use crate::processing::dispatch::{CancelToken, PassState, RowDispatcher};
use crate::telemetry::MetricsSnapshot;
use crate::template::{OffsetTable, TableCache, TemplateFamily, TemplateSpec, Window};

/// Row-parallel driver shared by every detector family: owns the worker
/// pool and the family's cached offset table.
pub struct RowOrchestrator<F: TemplateFamily> {
    dispatcher: RowDispatcher,
    cache: TableCache<F>,
}

impl<F: TemplateFamily> RowOrchestrator<F> {
    pub fn new(threads: usize) -> ColideResult<Self> {
        Ok(Self {
            dispatcher: RowDispatcher::new(F::KIND, threads)?,
            cache: TableCache::new(),
        })
    }

    pub fn threads(&self) -> usize {
        self.dispatcher.threads()
    }

    pub fn state(&self) -> PassState {
        self.dispatcher.state()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.dispatcher.metrics().snapshot()
    }

    pub fn table_rebuilds(&self) -> usize {
        self.cache.rebuilds()
    }

    pub fn table(&self) -> Option<&OffsetTable<F>> {
        self.cache.current()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.dispatcher.cancel_token()
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.dispatcher.set_cancel_token(token);
    }

    /// Builds or reuses the offset table for `reference`'s width, then scores
    /// every row of a fresh output grid with the scorer `make` returns.
    pub fn run_pass<'t, S, B>(
        &'t mut self,
        pass: &str,
        reference: &Grid,
        template: &TemplateSpec,
        missing: f32,
        make: B,
    ) -> ColideResult<Grid>
    where
        S: PixelScorer,
        B: FnOnce(&'t OffsetTable<F>) -> S,
    {
        let window = template.to_window()?;
        let (nx, ny) = reference.shape();
        let table = prepare_table(&mut self.cache, &mut self.dispatcher, nx, window)?;
        let scorer = make(table);
        self.dispatcher.run(pass, &scorer, nx, ny, missing)
    }

    /// Like [`RowOrchestrator::run_pass`] but fills two grids from one
    /// evaluation per pixel.
    pub fn run_dual_pass<'t, S, B>(
        &'t mut self,
        pass: &str,
        reference: &Grid,
        template: &TemplateSpec,
        missing: (f32, f32),
        make: B,
    ) -> ColideResult<(Grid, Grid)>
    where
        S: DualScorer,
        B: FnOnce(&'t OffsetTable<F>) -> S,
    {
        let window = template.to_window()?;
        let (nx, ny) = reference.shape();
        let table = prepare_table(&mut self.cache, &mut self.dispatcher, nx, window)?;
        let scorer = make(table);
        self.dispatcher.run_dual(pass, &scorer, nx, ny, missing)
    }
}

fn prepare_table<'t, F: TemplateFamily>(
    cache: &'t mut TableCache<F>,
    dispatcher: &mut RowDispatcher,
    nx: usize,
    window: Window,
) -> ColideResult<&'t OffsetTable<F>> {
    dispatcher.transition(PassState::BuildingOffsets);
    let table = cache.rebuild_if_needed(nx, window);
    if let Err(err) = table.ensure_bound_to(nx) {
        dispatcher.transition(PassState::Idle);
        return Err(err);
    }
    Ok(table)
}
