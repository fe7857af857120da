// Everything here runs behind jwt_auth_middleware

pub mod auth;
pub mod data;
pub mod schema;

pub use auth::me_get;
pub use data::{model_get, model_post, record_delete, record_get, record_put};
pub use schema::schema_get;
