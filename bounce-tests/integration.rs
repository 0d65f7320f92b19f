//! Integration tests for Bounce
//!
//! These tests run the time reference server on a loopback port and drive
//! real viewers against it over HTTP.

#[path = "style.rs"]
mod style;

#[path = "integration/viewer_sync.rs"]
mod viewer_sync;
#[path = "integration/static_assets.rs"]
mod static_assets;
