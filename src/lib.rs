//! taskdeck library
//!
//! Personal task manager: SQLite-backed store gateways, optimistic client
//! state, and an axum web UI.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod subscriptions;
pub mod types;
pub mod views;
