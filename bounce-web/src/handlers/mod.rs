//! HTTP request handlers organized by functionality

pub mod assets;
pub mod timer;

pub use assets::{index_page, logo, not_found, simulation_script};
pub use timer::timer;
