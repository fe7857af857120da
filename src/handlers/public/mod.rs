pub mod auth;
pub mod health;
pub mod setup;

pub use auth::{login_post, logout_post, refresh_post};
pub use health::health_get;
pub use setup::{init_post, status_get};
