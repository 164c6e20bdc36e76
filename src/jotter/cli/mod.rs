//! Command-line client. Everything that touches the terminal lives here.

pub mod args;
pub mod render;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");
