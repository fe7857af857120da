pub mod auth;
pub mod cookies;
pub mod response;

pub use auth::{extract_token, jwt_auth_middleware};
pub use response::{ApiResponse, ApiResult};
