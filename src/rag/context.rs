//! Context assembly from retrieved chunks and conversation turns

use serde::Deserialize;
use serde::Serialize;

use crate::models::preview;
use crate::models::ConversationTurn;
use crate::models::ScoredChunk;

const CHUNK_PREVIEW_CHARS: usize = 150;

/// Placeholder used when a prompt asks for history and there is none
pub const NO_PREVIOUS_CONVERSATION: &str = "No previous conversation";

/// Assembler for creating prompt context from retrieved chunks
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Join chunk texts with blank lines, best chunk first
    ///
    /// Stops before the chunk that would exceed the length budget, but the
    /// first chunk is always included.
    #[must_use]
    pub fn assemble(&self, results: &[ScoredChunk]) -> String {
        let mut context = String::new();
        let mut total_length = 0;

        for (idx, result) in results.iter().enumerate() {
            let text = result.chunk.text.as_str();
            let separator = if idx == 0 { 0 } else { 2 };
            let entry_length = text.chars().count() + separator;

            if idx > 0 && total_length + entry_length > self.max_context_length {
                break;
            }

            if idx > 0 {
                context.push_str("\n\n");
            }
            context.push_str(text);
            total_length += entry_length;
        }

        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(8000)
    }
}

/// Render turns as `role: content` lines
pub fn format_conversation(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return NO_PREVIOUS_CONVERSATION.to_string();
    }
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short, caller-facing view of a retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPreview {
    pub id: usize,
    pub text: String,
    pub score: f32,
}

pub fn chunk_previews(results: &[ScoredChunk]) -> Vec<ChunkPreview> {
    results
        .iter()
        .enumerate()
        .map(|(id, result)| ChunkPreview {
            id,
            text: preview(&result.chunk.text, CHUNK_PREVIEW_CHARS),
            score: result.score,
        })
        .collect()
}
