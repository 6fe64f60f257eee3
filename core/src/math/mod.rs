pub mod angle;
pub mod fuzzy;
pub mod stats;

pub use fuzzy::FuzzyFunction;
pub use stats::StatsHelper;
