pub mod offsets;
pub mod table;
pub mod window;

pub use offsets::Offsets;
pub use table::{OffsetTable, TableCache, TemplateEntry, TemplateFamily};
pub use window::{TemplateSpec, Window};
