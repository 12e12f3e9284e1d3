use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// A contiguous piece of document text together with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Empty when the chunk was stored without an embedding
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }
}

/// An uploaded document with its extracted text and ordered chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub text_content: String,
    pub chunks: Vec<Chunk>,
    pub uploaded_at: DateTime<Utc>,
}

/// A chunk paired with its similarity to a query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Position of the chunk within its document
    pub index: usize,
    /// Cosine similarity clamped into [0, 1]
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an assistant answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Greeting,
    PdfContent,
    #[serde(rename = "direct_ai_pdf_not_found")]
    DirectNoDocument,
    #[serde(rename = "direct_ai_no_chunks")]
    DirectNoChunks,
    #[serde(rename = "direct_ai_no_relevant_chunks")]
    DirectNoRelevantChunks,
    FallbackNoContext,
    Error,
}

impl SourceTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::PdfContent => "pdf_content",
            Self::DirectNoDocument => "direct_ai_pdf_not_found",
            Self::DirectNoChunks => "direct_ai_no_chunks",
            Self::DirectNoRelevantChunks => "direct_ai_no_relevant_chunks",
            Self::FallbackNoContext => "fallback_no_context",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval statistics attached to grounded answers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub relevant_chunks: usize,
    pub top_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            source: None,
            metadata: None,
        }
    }

    pub fn assistant(content: impl Into<String>, source: SourceTag) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            source: Some(source),
            metadata: None,
        }
    }

    #[must_use]
    pub const fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub const DEFAULT_SESSION_TITLE: &str = "Chat Session";

/// Conversation history for one (user, document) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub user_id: String,
    pub document_id: String,
    pub title: String,
    pub turns: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(user_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            document_id: document_id.into(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            turns: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Push a turn and bump `last_active`. Prior turns are never touched.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.last_active = Utc::now();
        self.turns.push(turn);
    }

    /// The last `k` turns in chronological order
    pub fn window(&self, k: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(k);
        &self.turns[start..]
    }

    /// The last `k` turns before the most recent one
    pub fn window_before_last(&self, k: usize) -> &[ConversationTurn] {
        let end = self.turns.len().saturating_sub(1);
        let start = end.saturating_sub(k);
        &self.turns[start..end]
    }

    /// Turns alternate user/assistant starting with a user turn
    pub fn is_alternating(&self) -> bool {
        self.turns.iter().enumerate().all(|(idx, turn)| {
            let expected = if idx % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            turn.role == expected
        })
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            last_active: self.last_active,
            turn_count: self.turns.len(),
            last_message_preview: self
                .turns
                .last()
                .map(|t| preview(&t.content, SESSION_PREVIEW_CHARS))
                .unwrap_or_default(),
        }
    }
}

const SESSION_PREVIEW_CHARS: usize = 100;

/// Listing entry for a stored session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub document_id: String,
    pub title: String,
    pub last_active: DateTime<Utc>,
    pub turn_count: usize,
    pub last_message_preview: String,
}

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
