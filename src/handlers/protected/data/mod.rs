pub mod model;
pub mod record;
pub mod utils;

// Re-export handler functions for use in routing
pub use model::get as model_get;
pub use model::post as model_post;

pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;
