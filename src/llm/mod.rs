//! Language-model generation
//!
//! The pipeline only sees the [`TextGenerator`] trait, so the HTTP client
//! is constructed once by the caller and injected; tests inject scripted
//! generators instead.

pub mod client;

use async_trait::async_trait;

pub use client::LlmService;

use crate::errors::Result;

/// Opaque text generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single-message prompt
    ///
    /// Fails on network errors, quota exhaustion or malformed responses.
    /// Implementations do not retry.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
