//! Prompt templates for document question answering
//!
//! Each intent renders through its own template. Every grounded template
//! tells the model to answer only from the supplied excerpts and gives the
//! exact sentence to use when they are not enough.

use crate::models::ConversationTurn;
use crate::models::ScoredChunk;
use crate::rag::classifier::is_document_question;
use crate::rag::classifier::QueryIntent;
use crate::rag::context::format_conversation;
use crate::rag::context::ContextAssembler;

/// Sentence the model must answer with when the context lacks the answer
pub const FALLBACK_ANSWER: &str = "I couldn't find that information in the document.";

/// Renders the instruction string sent to the language model
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer {
    assembler: ContextAssembler,
}

impl PromptComposer {
    pub const fn new(assembler: ContextAssembler) -> Self {
        Self { assembler }
    }

    /// Render the template for `intent`
    ///
    /// `conversation` is the recency window; it is only inlined by the
    /// greeting and conversational templates.
    pub fn compose(
        &self,
        intent: QueryIntent,
        context_chunks: &[ScoredChunk],
        conversation: &[ConversationTurn],
        message: &str,
        document_name: &str,
    ) -> String {
        let context = self.assembler.assemble(context_chunks);
        match intent {
            QueryIntent::Greeting => build_greeting_prompt(conversation, message, document_name),
            QueryIntent::SummaryRequest => build_summary_prompt(&context, message, document_name),
            QueryIntent::TechnicalQuery => build_technical_prompt(&context, message, document_name),
            QueryIntent::ListQuery => build_list_prompt(&context, message, document_name),
            QueryIntent::PersonQuery => build_person_prompt(&context, message, document_name),
            QueryIntent::DetailQuery => build_detail_prompt(&context, message, document_name),
            QueryIntent::General if is_document_question(message) => {
                build_document_prompt(&context, message, document_name)
            }
            QueryIntent::General => {
                build_conversation_prompt(&context, conversation, message, document_name)
            }
        }
    }
}

/// Compose with the default context budget
pub fn compose(
    intent: QueryIntent,
    context_chunks: &[ScoredChunk],
    conversation: &[ConversationTurn],
    message: &str,
    document_name: &str,
) -> String {
    PromptComposer::default().compose(intent, context_chunks, conversation, message, document_name)
}

fn grounding_rules() -> String {
    format!(
        "- Use ONLY the document content above. Do not add outside knowledge or guesses.\n\
         - If the content does not contain the answer, reply exactly: \"{FALLBACK_ANSWER}\""
    )
}

/// Greeting, continuing the conversation when there is history
pub fn build_greeting_prompt(
    conversation: &[ConversationTurn],
    message: &str,
    document_name: &str,
) -> String {
    if conversation.is_empty() {
        return format!(
            r#"Start a new conversation about a document.

DOCUMENT: "{document_name}"
USER SAID: "{message}"

Respond with a simple, friendly greeting, for example "Hello! How can I help you today?".
Keep it to one or two short sentences.
Do NOT mention or describe the document content: facts about it may only come from document excerpts, and none are supplied here.
If the user asks for information, reply exactly: "{FALLBACK_ANSWER}""#
        );
    }

    format!(
        r#"Continue the conversation naturally.

DOCUMENT: "{document_name}"

PREVIOUS MESSAGES:
{history}

USER JUST SAID: "{message}"

Respond with a simple, friendly greeting that continues the conversation.
Keep it casual and short (1-2 sentences max).
Do NOT introduce new facts about the document: facts may only come from document excerpts, and none are supplied here.
If the user asks for information, reply exactly: "{FALLBACK_ANSWER}""#,
        history = format_conversation(conversation),
    )
}

/// Structured summary of the document
pub fn build_summary_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are summarizing the document "{document_name}".

DOCUMENT CONTENT (relevant parts):
{context}

USER'S REQUEST: "{message}"

Instructions:
1. Start with one sentence stating what the document is
2. Follow with the main points as short bullet points
3. End with any conclusions or outcomes the document states
{rules}

Summary:"#,
        rules = grounding_rules(),
    )
}

/// Extraction of technologies, tools and skills
pub fn build_technical_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are extracting technical information from the document "{document_name}".

DOCUMENT CONTENT (relevant parts):
{context}

QUESTION: "{message}"

Instructions:
1. Identify every technology, framework, library, language and tool named in the content
2. List them exactly as written, grouped by kind when that helps
3. Mention how each is used only if the content says so
{rules}

Answer:"#,
        rules = grounding_rules(),
    )
}

/// Extraction of an enumerated list
pub fn build_list_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are extracting a list from the document "{document_name}".

DOCUMENT CONTENT (relevant parts):
{context}

QUESTION: "{message}"

Instructions:
1. Answer with a numbered list
2. Include every matching item found in the content, in document order
3. Keep each item to one line
{rules}

Answer:"#,
        rules = grounding_rules(),
    )
}

/// Extraction of people and their roles
pub fn build_person_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are identifying people mentioned in the document "{document_name}".

DOCUMENT CONTENT (relevant parts):
{context}

QUESTION: "{message}"

Instructions:
1. Name each relevant person exactly as written, including titles such as "Dr." or "Prof."
2. State each person's role (author, student, supervisor, professor) only when the content gives it
3. Never invent names or roles
{rules}

Answer:"#,
        rules = grounding_rules(),
    )
}

/// Detailed explanation of a process or section
pub fn build_detail_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are explaining part of the document "{document_name}" in detail.

DOCUMENT CONTENT (relevant parts):
{context}

QUESTION: "{message}"

Instructions:
1. Give a thorough, step-by-step explanation
2. Quote the document directly where it helps
3. Cover the process, methodology or mechanism the user asked about
{rules}

Explanation:"#,
        rules = grounding_rules(),
    )
}

/// Question about the document as a whole
pub fn build_document_prompt(context: &str, message: &str, document_name: &str) -> String {
    format!(
        r#"You are helping a user understand a document.

DOCUMENT: "{document_name}"

DOCUMENT CONTENT (relevant parts):
{context}

USER'S QUESTION: "{message}"

Instructions:
1. Give a helpful, direct answer about the document
2. Be concise but complete
{rules}

Answer:"#,
        rules = grounding_rules(),
    )
}

/// Strictly grounded answer that keeps conversational continuity
pub fn build_conversation_prompt(
    context: &str,
    conversation: &[ConversationTurn],
    message: &str,
    document_name: &str,
) -> String {
    format!(
        r#"You are having a conversation with a user about a document.

PREVIOUS CONVERSATION (for context):
{history}

DOCUMENT: "{document_name}"

RELEVANT DOCUMENT CONTENT:
{context}

USER'S CURRENT QUESTION: "{message}"

Instructions:
1. Answer the current question, continuing the conversation naturally
2. Use the previous conversation only to understand what the user refers to
{rules}

Answer:"#,
        history = format_conversation(conversation),
        rules = grounding_rules(),
    )
}

/// Prompt used when no document context is available
pub fn build_ungrounded_prompt(
    conversation: &[ConversationTurn],
    message: &str,
    document_name: Option<&str>,
) -> String {
    let document_line = document_name.map_or_else(
        || "No document is available for this conversation.".to_string(),
        |name| format!("The document \"{name}\" could not provide any usable content for this question."),
    );

    format!(
        r#"You are a helpful assistant.

{document_line}

PREVIOUS CONVERSATION (for context):
{history}

USER'S QUESTION: "{message}"

Instructions:
1. Answer helpfully and concisely
2. Do not claim to quote or summarize the document
3. If the question is about the document's content, reply exactly: "{FALLBACK_ANSWER}"

Answer:"#,
        history = format_conversation(conversation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use crate::models::SourceTag;

    const DOC: &str = "thesis.pdf";

    fn context_chunks() -> Vec<ScoredChunk> {
        vec![ScoredChunk {
            chunk: Chunk::new("The project uses React and Node.js.", vec![1.0]),
            index: 0,
            score: 0.8,
        }]
    }

    fn history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("What is this about?"),
            ConversationTurn::assistant("A web project.", SourceTag::PdfContent),
        ]
    }

    const GROUNDED: [QueryIntent; 6] = [
        QueryIntent::SummaryRequest,
        QueryIntent::TechnicalQuery,
        QueryIntent::ListQuery,
        QueryIntent::PersonQuery,
        QueryIntent::DetailQuery,
        QueryIntent::General,
    ];

    #[test]
    fn test_grounded_templates_contain_rules_context_and_name() {
        let chunks = context_chunks();
        for intent in GROUNDED {
            let prompt = compose(intent, &chunks, &history(), "when was it made", DOC);
            assert!(prompt.contains("Use ONLY the document content"), "{intent}");
            assert!(prompt.contains(FALLBACK_ANSWER), "{intent}");
            assert!(prompt.contains(DOC), "{intent}");
            assert!(prompt.contains("React and Node.js"), "{intent}");
            assert!(prompt.contains("when was it made"), "{intent}");
        }
    }

    #[test]
    fn test_templates_are_distinct() {
        let chunks = context_chunks();
        let prompts: Vec<String> = GROUNDED
            .iter()
            .map(|intent| compose(*intent, &chunks, &[], "question", DOC))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in &prompts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_technical_template() {
        let prompt = compose(
            QueryIntent::TechnicalQuery,
            &context_chunks(),
            &[],
            "What technologies are used?",
            DOC,
        );
        assert!(prompt.contains("extracting technical information"));
        assert!(prompt.contains("QUESTION: \"What technologies are used?\""));
    }

    #[test]
    fn test_history_only_inlined_for_conversation() {
        let chunks = context_chunks();
        let general = compose(QueryIntent::General, &chunks, &history(), "when was it made", DOC);
        assert!(general.contains("assistant: A web project."));

        let list = compose(QueryIntent::ListQuery, &chunks, &history(), "list them", DOC);
        assert!(!list.contains("assistant: A web project."));
    }

    #[test]
    fn test_general_document_question_uses_document_template() {
        let prompt = compose(
            QueryIntent::General,
            &context_chunks(),
            &history(),
            "what is in the pdf",
            DOC,
        );
        assert!(prompt.contains("helping a user understand a document"));
        assert!(!prompt.contains("PREVIOUS CONVERSATION"));
    }

    #[test]
    fn test_greeting_new_and_continuing() {
        let fresh = compose(QueryIntent::Greeting, &[], &[], "hi", DOC);
        assert!(fresh.contains("Start a new conversation"));
        assert!(fresh.contains(DOC));
        assert!(fresh.contains(FALLBACK_ANSWER));

        let continuing = compose(QueryIntent::Greeting, &[], &history(), "hello again", DOC);
        assert!(continuing.contains("Continue the conversation"));
        assert!(continuing.contains("user: What is this about?"));
    }

    #[test]
    fn test_compose_is_pure() {
        let chunks = context_chunks();
        let a = compose(QueryIntent::DetailQuery, &chunks, &history(), "explain", DOC);
        let b = compose(QueryIntent::DetailQuery, &chunks, &history(), "explain", DOC);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ungrounded_prompt() {
        let prompt = build_ungrounded_prompt(&[], "what is rust", None);
        assert!(prompt.contains("No document is available"));
        assert!(prompt.contains("No previous conversation"));

        let named = build_ungrounded_prompt(&history(), "and then?", Some(DOC));
        assert!(named.contains(DOC));
        assert!(named.contains("user: What is this about?"));
    }
}
