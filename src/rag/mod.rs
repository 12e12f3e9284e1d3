//! RAG (Retrieval-Augmented Generation) module
//!
//! Document question answering built from small, mostly pure stages:
//! - Chunking extracted text into overlapping pieces
//! - Ranking chunks against a query by cosine similarity
//! - Classifying the query intent with an ordered rule table
//! - Composing a grounded prompt per intent
//! - Generating the answer, with one no-context retry on failure
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docrag::config::AppConfig;
//! use docrag::llm::LlmService;
//! use docrag::rag::ChatService;
//! use docrag::session::SessionManager;
//! use docrag::store::InMemoryDocumentStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = ChatService::new(
//!         &config,
//!         Arc::new(LlmService::new(&config)?),
//!         Arc::new(InMemoryDocumentStore::new()),
//!         SessionManager::in_memory(),
//!     );
//!
//!     let text = std::fs::read_to_string("report.txt")?;
//!     let document = service.add_document("alice", "report.txt", &text).await?;
//!     let reply = service
//!         .ask("alice", &document.id, "What technologies are used?")
//!         .await?;
//!     println!("{} ({})", reply.answer, reply.source);
//!
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod classifier;
pub mod context;
pub mod ingest;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

pub use chunker::chunk_text;
pub use chunker::TextChunker;
pub use classifier::classify;
pub use classifier::is_document_question;
pub use classifier::QueryIntent;
pub use context::ChunkPreview;
pub use context::ContextAssembler;
pub use ingest::DocumentIngestor;
pub use pipeline::ChatReply;
pub use pipeline::ChatService;
pub use prompts::compose;
pub use prompts::PromptComposer;
pub use prompts::FALLBACK_ANSWER;
pub use retriever::cosine_similarity;
pub use retriever::retrieve;
pub use retriever::Retriever;
