//! Embeddings generation module
//!
//! Text is embedded with a lexical hashing scheme instead of a learned
//! model: no network, no weights, fully deterministic. Similar vocabulary
//! lands in similar buckets, which is enough to rank chunks of a single
//! document against a question.
//!
//! # Examples
//!
//! ```rust
//! use docrag::embeddings::EmbeddingService;
//!
//! let service = EmbeddingService::new(128);
//! let embedding = service.generate("Hello, world!");
//! assert_eq!(embedding.len(), 128);
//! ```

pub mod generator;
pub mod text_preprocessing;

pub use generator::embed;
pub use generator::magnitude;
pub use generator::EmbeddingService;

/// Default embedding dimension shared by stored chunks and queries
pub const DEFAULT_EMBEDDING_DIM: usize = 128;
