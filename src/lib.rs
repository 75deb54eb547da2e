pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod permission;
pub mod progress;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;
