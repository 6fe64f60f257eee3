use crate::prelude::DetectorKind;
use log::{debug, info, trace, warn};

/// Tags pass-level log lines with the detector family.
#[derive(Debug, Clone, Copy)]
pub struct PassLogger {
    kind: DetectorKind,
}

impl PassLogger {
    pub fn new(kind: DetectorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DetectorKind {
        self.kind
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.kind, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.kind, message);
    }

    pub fn transition(&self, message: &str) {
        trace!("[{}] {}", self.kind, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.kind, message);
    }
}
