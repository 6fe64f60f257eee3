pub mod dispatch;
pub mod ellipse;
pub mod enhance;
pub mod line;
pub mod orchestrator;
pub mod shear;

pub use dispatch::{CancelToken, PassState, RowDispatcher, RowJob};
pub use ellipse::{EllipseDetector, EllipseMode, EllipseParams};
pub use enhance::{EnhanceDetector, EnhanceParams};
pub use line::{LineDetector, LineParams};
pub use orchestrator::RowOrchestrator;
pub use shear::{ShearDetector, ShearParams, ValueRange};
