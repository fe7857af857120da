pub mod error;
pub mod registry;
pub mod traits;

pub use error::HookError;
pub use registry::{HookRegistry, ModelMatcher};
pub use traits::{CrudHooks, HookContext};
