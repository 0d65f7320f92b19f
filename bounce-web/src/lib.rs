//! Bounce Web - Time reference server
//!
//! Serves the `{epoch, time}` reference every viewer synchronises against,
//! along with the viewer page and its logo assets.

#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, WebError, build_router, run_server, serve};
