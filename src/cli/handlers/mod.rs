//! CLI command handlers
//!
//! - inspect: chunking, embedding and classification of ad-hoc input
//! - chat: one-shot and interactive questions about a text file

pub mod chat;
pub mod inspect;

pub use chat::*;
pub use inspect::*;
