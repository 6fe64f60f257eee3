use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters accumulated across every pass of one orchestrator.
pub struct PassMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub passes: usize,
    pub rows: usize,
    pub valid_cells: usize,
    pub missing_cells: usize,
    pub cancelled: usize,
}

impl PassMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_row(&self, valid: usize, missing: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rows += 1;
            metrics.valid_cells += valid;
            metrics.missing_cells += missing;
        }
    }

    pub fn record_pass(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.passes += 1;
        }
    }

    pub fn record_cancelled(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cancelled += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for PassMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_accumulate_cell_counts() {
        let metrics = PassMetrics::new();
        metrics.record_row(3, 2);
        metrics.record_row(1, 4);
        metrics.record_pass();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rows, 2);
        assert_eq!(snapshot.valid_cells, 4);
        assert_eq!(snapshot.missing_cells, 6);
        assert_eq!(snapshot.passes, 1);
    }
}
