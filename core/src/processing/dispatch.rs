use crate::grid::Grid;
use crate::prelude::{ColideError, ColideResult, DetectorKind, DualScorer, PixelScorer};
use crate::telemetry::{PassLogger, PassMetrics};
use ndarray::ArrayViewMut1;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    BuildingOffsets,
    Dispatching,
    Running,
    Joined,
}

/// Shared flag checked before each row is scored.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Unit of parallel work: one output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowJob {
    pub y: usize,
    pub nx: usize,
}

impl RowJob {
    /// Scores every cell of the row, writing the missing value where the
    /// scorer declines. Returns `(valid, missing)` cell counts.
    pub fn score_into<S: PixelScorer + ?Sized>(
        &self,
        scorer: &S,
        mut row: ArrayViewMut1<'_, f32>,
        missing: f32,
    ) -> (usize, usize) {
        debug_assert_eq!(row.len(), self.nx);
        let mut valid = 0;
        for (x, cell) in row.iter_mut().enumerate() {
            match scorer.score(x, self.y) {
                Some(value) if value.is_finite() => {
                    *cell = value;
                    valid += 1;
                }
                _ => *cell = missing,
            }
        }
        (valid, self.nx - valid)
    }

    /// Two-output variant of [`RowJob::score_into`]. Counts are taken from
    /// the first row.
    pub fn score_pair_into<S: DualScorer + ?Sized>(
        &self,
        scorer: &S,
        mut first: ArrayViewMut1<'_, f32>,
        mut second: ArrayViewMut1<'_, f32>,
        missing: (f32, f32),
    ) -> (usize, usize) {
        debug_assert_eq!(first.len(), self.nx);
        debug_assert_eq!(second.len(), self.nx);
        let mut valid = 0;
        for (x, (a, b)) in first.iter_mut().zip(second.iter_mut()).enumerate() {
            let (va, vb) = scorer
                .score_pair(x, self.y)
                .unwrap_or((f32::NAN, f32::NAN));
            if va.is_finite() {
                *a = va;
                valid += 1;
            } else {
                *a = missing.0;
            }
            *b = if vb.is_finite() { vb } else { missing.1 };
        }
        (valid, self.nx - valid)
    }
}

/// Fixed-size worker pool that scores a grid one row per job.
///
/// With a single thread no pool is created and rows run on the caller's
/// thread in order.
pub struct RowDispatcher {
    threads: usize,
    pool: Option<rayon::ThreadPool>,
    cancel: CancelToken,
    metrics: PassMetrics,
    logger: PassLogger,
    state: PassState,
}

impl RowDispatcher {
    pub fn new(kind: DetectorKind, threads: usize) -> ColideResult<Self> {
        if threads == 0 {
            return Err(ColideError::WorkerPool(
                "thread count must be at least 1".into(),
            ));
        }
        let pool = if threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(move |i| format!("colide-{}-{}", kind, i))
                .build()
                .map_err(|err| ColideError::WorkerPool(err.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(Self {
            threads,
            pool,
            cancel: CancelToken::new(),
            metrics: PassMetrics::new(),
            logger: PassLogger::new(kind),
            state: PassState::Idle,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn metrics(&self) -> &PassMetrics {
        &self.metrics
    }

    pub fn logger(&self) -> &PassLogger {
        &self.logger
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = token;
    }

    pub fn transition(&mut self, next: PassState) {
        self.logger
            .transition(&format!("{:?} -> {:?}", self.state, next));
        self.state = next;
    }

    /// Scores an `nx` by `ny` grid and blocks until every row is joined.
    ///
    /// The output starts all-missing and every cell is written exactly once.
    /// A cancelled pass returns an error rather than a partial grid.
    pub fn run<S: PixelScorer>(
        &mut self,
        pass: &str,
        scorer: &S,
        nx: usize,
        ny: usize,
        missing: f32,
    ) -> ColideResult<Grid> {
        let mut output = Grid::new(nx, ny, missing);
        self.begin(pass, ny);

        let completed = AtomicUsize::new(0);
        let cancel = &self.cancel;
        let metrics = &self.metrics;
        let score_row = |(y, row): (usize, ArrayViewMut1<'_, f32>)| {
            if cancel.is_cancelled() {
                return;
            }
            let job = RowJob { y, nx };
            let (valid, missing_cells) = job.score_into(scorer, row, missing);
            metrics.record_row(valid, missing_cells);
            completed.fetch_add(1, Ordering::Relaxed);
        };

        match &self.pool {
            Some(pool) => pool.install(|| {
                output
                    .rows_mut()
                    .into_par_iter()
                    .enumerate()
                    .for_each(&score_row)
            }),
            None => output.rows_mut().enumerate().for_each(&score_row),
        }

        let rows_completed = completed.into_inner();
        let valid = output.valid_count();
        self.finish(pass, rows_completed, ny, valid, nx * ny)?;
        Ok(output)
    }

    /// Scores two `nx` by `ny` grids in one sweep; row `y` of both outputs
    /// is written by the same job.
    pub fn run_dual<S: DualScorer>(
        &mut self,
        pass: &str,
        scorer: &S,
        nx: usize,
        ny: usize,
        missing: (f32, f32),
    ) -> ColideResult<(Grid, Grid)> {
        let mut first = Grid::new(nx, ny, missing.0);
        let mut second = Grid::new(nx, ny, missing.1);
        self.begin(pass, ny);

        let completed = AtomicUsize::new(0);
        let cancel = &self.cancel;
        let metrics = &self.metrics;
        type RowPair<'r> = (ArrayViewMut1<'r, f32>, ArrayViewMut1<'r, f32>);
        let score_rows = |(y, (a, b)): (usize, RowPair<'_>)| {
            if cancel.is_cancelled() {
                return;
            }
            let job = RowJob { y, nx };
            let (valid, missing_cells) = job.score_pair_into(scorer, a, b, missing);
            metrics.record_row(valid, missing_cells);
            completed.fetch_add(1, Ordering::Relaxed);
        };

        match &self.pool {
            Some(pool) => pool.install(|| {
                first
                    .rows_mut()
                    .into_par_iter()
                    .zip(second.rows_mut().into_par_iter())
                    .enumerate()
                    .for_each(&score_rows)
            }),
            None => first
                .rows_mut()
                .zip(second.rows_mut())
                .enumerate()
                .for_each(&score_rows),
        }

        let rows_completed = completed.into_inner();
        let valid = first.valid_count();
        self.finish(pass, rows_completed, ny, valid, nx * ny)?;
        Ok((first, second))
    }

    fn begin(&mut self, pass: &str, ny: usize) {
        self.transition(PassState::Dispatching);
        self.logger.detail(&format!(
            "{}: dispatching {} rows on {} thread(s)",
            pass, ny, self.threads
        ));
        self.transition(PassState::Running);
    }

    /// Joins the pass and turns an interrupted sweep into an error.
    fn finish(
        &mut self,
        pass: &str,
        rows_completed: usize,
        rows_total: usize,
        valid: usize,
        cells: usize,
    ) -> ColideResult<()> {
        self.transition(PassState::Joined);
        let outcome = if rows_completed < rows_total && self.cancel.is_cancelled() {
            self.metrics.record_cancelled();
            self.logger.warn(&format!(
                "{}: cancelled after {} of {} rows",
                pass, rows_completed, rows_total
            ));
            Err(ColideError::Cancelled {
                rows_completed,
                rows_total,
            })
        } else {
            self.metrics.record_pass();
            self.logger
                .record(&format!("{}: {} valid of {} cells", pass, valid, cells));
            Ok(())
        };
        self.transition(PassState::Idle);
        outcome
    }
}
