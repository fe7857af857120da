// handlers/mod.rs - Two-tier handler layout
//
// Public (no token) → Protected (access token via jwt_auth_middleware)

pub mod protected;
pub mod public;
pub mod utils;
