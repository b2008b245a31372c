//! Web UI: the page shell, htmx fragments, and the JSON API.

pub mod server;
pub mod templates;

pub use server::{AppServer, start_server};
