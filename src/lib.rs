//! Multi-user task tracker: registration, sessions and per-owner task
//! storage behind a swappable repository layer.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod store;
pub mod tasks;
pub mod validation;

#[cfg(test)]
mod testing;
