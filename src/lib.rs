pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod middleware;
pub mod query;
pub mod sanitizer;
pub mod schema;
pub mod types;

#[cfg(test)]
pub mod testing;
