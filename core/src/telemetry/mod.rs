pub mod log;
pub mod metrics;

pub use self::log::PassLogger;
pub use self::metrics::{MetricsSnapshot, PassMetrics};
