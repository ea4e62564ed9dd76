mod traits;

pub use traits::{AsyncModule, ModuleId, ModuleMessage};
