//! Turning extracted document text into stored chunks

use chrono::Utc;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::DocRagError;
use crate::errors::Result;
use crate::models::Chunk;
use crate::models::Document;
use crate::rag::chunker::TextChunker;

/// Chunks and embeds extracted text into a [`Document`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentIngestor {
    chunker: TextChunker,
    embedder: EmbeddingService,
}

impl DocumentIngestor {
    pub const fn new(chunker: TextChunker, embedder: EmbeddingService) -> Self {
        Self { chunker, embedder }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            TextChunker::from_config(&config.chunking),
            EmbeddingService::from_config(config),
        )
    }

    /// Build a document ready to persist
    ///
    /// # Errors
    /// - `InvalidInput` when the extracted text is empty or whitespace
    pub fn ingest(&self, owner_id: &str, filename: &str, text: &str) -> Result<Document> {
        if text.trim().is_empty() {
            warn!("No text extracted from {}", filename);
            return Err(DocRagError::InvalidInput(format!(
                "could not extract text from {filename}"
            )));
        }

        let texts = self.chunker.chunk(text);
        let embeddings = self.embedder.generate_batch(&texts);
        let chunks: Vec<Chunk> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| Chunk::new(text, embedding))
            .collect();

        let document = Document {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            filename: filename.to_string(),
            text_content: text.to_string(),
            chunks,
            uploaded_at: Utc::now(),
        };

        info!(
            "Ingested {} into {} chunks ({} chars)",
            filename,
            document.chunks.len(),
            document.text_content.chars().count()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::magnitude;

    #[test]
    fn test_ingest_chunks_and_embeds() {
        let ingestor = DocumentIngestor::default();
        let document = ingestor
            .ingest(
                "alice",
                "report.pdf",
                "The project uses React and Node.js. It was supervised by Dr. Smith.",
            )
            .unwrap();

        assert_eq!(document.owner_id, "alice");
        assert_eq!(document.filename, "report.pdf");
        assert_eq!(document.chunks.len(), 1);
        assert_eq!(document.chunks[0].embedding.len(), 128);
        assert!((magnitude(&document.chunks[0].embedding) - 1.0).abs() < 1e-5);
        assert!(Uuid::parse_str(&document.id).is_ok());
    }

    #[test]
    fn test_ingest_rejects_blank_text() {
        let ingestor = DocumentIngestor::default();
        for text in ["", "  \n\t "] {
            assert!(matches!(
                ingestor.ingest("alice", "scan.pdf", text),
                Err(DocRagError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_ingest_uses_configured_dimension() {
        let mut config = AppConfig::default();
        config.embeddings.dimension = 16;
        config.chunking.chunk_size = 40;
        config.chunking.chunk_overlap = 5;

        let document = DocumentIngestor::from_config(&config)
            .ingest("alice", "notes.txt", &"A short sentence here. ".repeat(10))
            .unwrap();
        assert!(document.chunks.len() > 1);
        assert!(document.chunks.iter().all(|c| c.embedding.len() == 16));
    }
}
