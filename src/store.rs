//! Document persistence
//!
//! The pipeline reads documents through [`DocumentStore`]; durable backends
//! live outside this crate. [`InMemoryDocumentStore`] serves the CLI and
//! tests.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::Result;
use crate::models::Chunk;
use crate::models::Document;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save_document(&self, document: Document) -> Result<()>;

    /// `None` when absent or owned by another user
    async fn load_document(&self, owner_id: &str, document_id: &str) -> Result<Option<Document>>;

    /// Ordered chunks with their stored embeddings
    async fn load_chunks(&self, owner_id: &str, document_id: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .load_document(owner_id, document_id)
            .await?
            .map(|document| document.chunks)
            .unwrap_or_default())
    }

    /// Newest upload first
    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>>;

    /// Returns whether a document was removed
    async fn delete_document(&self, owner_id: &str, document_id: &str) -> Result<bool>;
}

/// Process-local document store keyed by document id
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<String, Document>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn save_document(&self, document: Document) -> Result<()> {
        debug!(
            "Saving document {} ({} chunks) for {}",
            document.id,
            document.chunks.len(),
            document.owner_id
        );
        self.documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn load_document(&self, owner_id: &str, document_id: &str) -> Result<Option<Document>> {
        Ok(self
            .documents
            .get(document_id)
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone()))
    }

    async fn load_chunks(&self, owner_id: &str, document_id: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .documents
            .get(document_id)
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.chunks.clone())
            .unwrap_or_default())
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents)
    }

    async fn delete_document(&self, owner_id: &str, document_id: &str) -> Result<bool> {
        Ok(self
            .documents
            .remove_if(document_id, |_, document| document.owner_id == owner_id)
            .is_some())
    }
}
