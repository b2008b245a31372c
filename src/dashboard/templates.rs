//! HTML templates for the web UI.
//!
//! Templates are embedded at compile time using `include_str!`.

/// The single-page shell: sidebar of views and lists, task panel.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
