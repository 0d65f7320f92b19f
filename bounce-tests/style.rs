//! Style Enforcement Tests
//!
//! Scans the production sources of every workspace crate for patterns that
//! clippy does not reject on its own.

#[path = "style/panic_free_production.rs"]
mod panic_free_production;
