//! CLI module for the `docrag` binary
//!
//! - Command line argument parsing
//! - Command handlers (inspection of the pure stages, and chat)
//! - Output formatting

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::*;
pub use handlers::*;
pub use output::*;
