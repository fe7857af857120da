pub mod error;
pub mod handler;

pub use error::CrudError;
pub use handler::{ApiHandler, ApiOptions, PageMeta, Paginated};
