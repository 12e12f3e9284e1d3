//! Chat pipeline: Classify -> Retrieve -> Compose -> Generate
//!
//! Every request records exactly one user turn and one assistant turn, in
//! that order, while holding the session's mutation slot. Generation
//! failures never escape as errors: a grounded call is retried once
//! without document context, and after that the caller gets a fixed
//! apology with the failure kept aside in [`ChatReply::diagnostic`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::DocRagError;
use crate::errors::Result;
use crate::llm::TextGenerator;
use crate::models::Chunk;
use crate::models::ConversationSession;
use crate::models::ConversationTurn;
use crate::models::Document;
use crate::models::ScoredChunk;
use crate::models::SourceTag;
use crate::models::TurnMetadata;
use crate::models::DEFAULT_SESSION_TITLE;
use crate::rag::classifier::classify;
use crate::rag::classifier::QueryIntent;
use crate::rag::context::chunk_previews;
use crate::rag::context::ChunkPreview;
use crate::rag::ingest::DocumentIngestor;
use crate::rag::prompts::build_ungrounded_prompt;
use crate::rag::prompts::PromptComposer;
use crate::rag::retriever::Retriever;
use crate::session::SessionHandle;
use crate::session::SessionManager;
use crate::store::DocumentStore;

/// Shown to the user when no answer could be generated at all
pub const GENERIC_FAILURE_ANSWER: &str =
    "I'm sorry, I couldn't generate a response right now. Please try again in a moment.";

/// Answer returned to the caller of [`ChatService::ask`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub source: SourceTag,
    /// Previews of the chunks the answer was grounded on
    pub relevant_chunks: Vec<ChunkPreview>,
    pub session_id: Uuid,
    /// Failure detail for operators; never part of `answer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Result of one pass through the answering paths
struct Outcome {
    answer: String,
    source: SourceTag,
    grounding: Vec<ScoredChunk>,
    diagnostic: Option<String>,
}

impl Outcome {
    fn answered(answer: String, source: SourceTag) -> Self {
        Self {
            answer,
            source,
            grounding: Vec::new(),
            diagnostic: None,
        }
    }

    fn failed(diagnostic: String) -> Self {
        Self {
            answer: GENERIC_FAILURE_ANSWER.to_string(),
            source: SourceTag::Error,
            grounding: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

/// Document chat service
pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
    documents: Arc<dyn DocumentStore>,
    sessions: SessionManager,
    ingestor: DocumentIngestor,
    embedder: EmbeddingService,
    retriever: Retriever,
    composer: PromptComposer,
    window_size: usize,
    greeting_window: usize,
    generation_timeout: Duration,
}

impl ChatService {
    pub fn new(
        config: &AppConfig,
        generator: Arc<dyn TextGenerator>,
        documents: Arc<dyn DocumentStore>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            generator,
            documents,
            sessions,
            ingestor: DocumentIngestor::from_config(config),
            embedder: EmbeddingService::from_config(config),
            retriever: Retriever::from_config(&config.retrieval),
            composer: PromptComposer::default(),
            window_size: config.conversation.window_size,
            greeting_window: config.conversation.greeting_window,
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Ingest extracted text and persist the resulting document
    pub async fn add_document(&self, owner_id: &str, filename: &str, text: &str) -> Result<Document> {
        let document = self.ingestor.ingest(owner_id, filename, text)?;
        self.documents.save_document(document.clone()).await?;
        Ok(document)
    }

    /// Delete a document together with every chat about it
    pub async fn delete_document(&self, owner_id: &str, document_id: &str) -> Result<()> {
        if !self.documents.delete_document(owner_id, document_id).await? {
            return Err(DocRagError::DocumentNotFound(document_id.to_string()));
        }
        let removed = self
            .sessions
            .delete_for_document(owner_id, document_id)
            .await?;
        info!(
            "Deleted document {} and {} chat session(s)",
            document_id, removed
        );
        Ok(())
    }

    /// Full turn history of the pair, oldest first
    pub async fn history(&self, user_id: &str, document_id: &str) -> Result<Vec<ConversationTurn>> {
        self.sessions.window(user_id, document_id, usize::MAX).await
    }

    /// Answer one message about one document
    ///
    /// # Errors
    /// - `InvalidInput` for an empty message
    /// - Store errors while loading the document or saving the session
    ///
    /// Generation failures are reported through the reply, not as errors.
    pub async fn ask(&self, user_id: &str, document_id: &str, message: &str) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DocRagError::InvalidInput(
                "message cannot be empty".to_string(),
            ));
        }

        let handle = self.sessions.get_or_create(user_id, document_id).await?;
        let result = self.exchange(&handle, user_id, document_id, message).await;
        self.sessions.release(user_id, document_id, handle);
        result
    }

    /// One user turn and one assistant turn under the session's slot
    async fn exchange(
        &self,
        handle: &SessionHandle,
        user_id: &str,
        document_id: &str,
        message: &str,
    ) -> Result<ChatReply> {
        let mut session = handle.lock().await;

        // Store reads come before the user turn so a failed read leaves the
        // session untouched
        let document = self.documents.load_document(user_id, document_id).await?;
        let chunks = match &document {
            Some(document) => {
                self.documents
                    .load_chunks(&document.owner_id, &document.id)
                    .await?
            }
            None => Vec::new(),
        };
        session.append(ConversationTurn::user(message));

        let outcome = match document {
            Some(document) => {
                if session.title == DEFAULT_SESSION_TITLE {
                    session.title = format!("Chat about {}", document.filename);
                }
                self.answer_from_document(&session, &document, &chunks, message)
                    .await
            }
            None => {
                warn!(
                    "Document {} not found for user {}, answering without it",
                    document_id, user_id
                );
                self.answer_ungrounded(&session, message, None, SourceTag::DirectNoDocument)
                    .await
            }
        };

        let mut turn = ConversationTurn::assistant(outcome.answer.clone(), outcome.source);
        if let Some(top) = outcome.grounding.first() {
            turn = turn.with_metadata(TurnMetadata {
                relevant_chunks: outcome.grounding.len(),
                top_score: top.score,
            });
        }
        session.append(turn);
        self.sessions.save(&session).await?;

        info!(
            "Answered message in session {} (source: {}, {} chunks)",
            session.id,
            outcome.source,
            outcome.grounding.len()
        );

        Ok(ChatReply {
            answer: outcome.answer,
            source: outcome.source,
            relevant_chunks: chunk_previews(&outcome.grounding),
            session_id: session.id,
            diagnostic: outcome.diagnostic,
        })
    }

    /// Paths for a known document; the user turn is already recorded
    async fn answer_from_document(
        &self,
        session: &ConversationSession,
        document: &Document,
        chunks: &[Chunk],
        message: &str,
    ) -> Outcome {
        let intent = classify(message);
        debug!("Classified message as {}", intent);

        if intent == QueryIntent::Greeting {
            let previous = session.window_before_last(self.greeting_window);
            let prompt = self
                .composer
                .compose(intent, &[], previous, message, &document.filename);
            return match self.generate(&prompt).await {
                Ok(answer) => Outcome::answered(answer, SourceTag::Greeting),
                Err(e) => Self::give_up(&e, None),
            };
        }

        if chunks.is_empty() {
            warn!("Document {} has no chunks", document.id);
            return self
                .answer_ungrounded(
                    session,
                    message,
                    Some(&document.filename),
                    SourceTag::DirectNoChunks,
                )
                .await;
        }

        let query = self.embedder.generate(message);
        let grounding = self.retriever.retrieve(&query, chunks);
        if grounding.is_empty() {
            return self
                .answer_ungrounded(
                    session,
                    message,
                    Some(&document.filename),
                    SourceTag::DirectNoRelevantChunks,
                )
                .await;
        }

        let window = session.window_before_last(self.window_size);
        let prompt = self
            .composer
            .compose(intent, &grounding, window, message, &document.filename);
        debug!("Grounded prompt ({} chars):\n{}", prompt.len(), prompt);

        match self.generate(&prompt).await {
            Ok(answer) => Outcome {
                answer,
                source: SourceTag::PdfContent,
                grounding,
                diagnostic: None,
            },
            Err(e) if e.is_generation_failure() => {
                warn!("Grounded generation failed, retrying without context: {}", e);
                let prompt = build_ungrounded_prompt(window, message, Some(&document.filename));
                match self.generate(&prompt).await {
                    Ok(answer) => Outcome::answered(answer, SourceTag::FallbackNoContext),
                    Err(retry) => Self::give_up(&retry, Some(&e)),
                }
            }
            Err(e) => Self::give_up(&e, None),
        }
    }

    async fn answer_ungrounded(
        &self,
        session: &ConversationSession,
        message: &str,
        document_name: Option<&str>,
        source: SourceTag,
    ) -> Outcome {
        let window = session.window_before_last(self.window_size);
        let prompt = build_ungrounded_prompt(window, message, document_name);
        match self.generate(&prompt).await {
            Ok(answer) => Outcome::answered(answer, source),
            Err(e) => Self::give_up(&e, None),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.generation_timeout, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(DocRagError::GenerationTimeout(
                self.generation_timeout.as_secs(),
            )),
        }
    }

    fn give_up(last: &DocRagError, first: Option<&DocRagError>) -> Outcome {
        let diagnostic = match first {
            Some(first) => format!("{first}; retry without context: {last}"),
            None => last.to_string(),
        };
        error!("Generation failed: {}", diagnostic);
        Outcome::failed(diagnostic)
    }
}
