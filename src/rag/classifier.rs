//! Rule-based query intent classification
//!
//! Rules are an ordered table of `(predicate, intent)` pairs; the first
//! predicate that matches decides the intent and `General` catches the rest.
//! Matching is lexical on the trimmed, lowercased message.

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Greeting,
    SummaryRequest,
    TechnicalQuery,
    ListQuery,
    PersonQuery,
    DetailQuery,
    General,
}

impl QueryIntent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::SummaryRequest => "summary_request",
            Self::TechnicalQuery => "technical_query",
            Self::ListQuery => "list_query",
            Self::PersonQuery => "person_query",
            Self::DetailQuery => "detail_query",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "hi there",
    "hello there",
];

const GREETING_PREFIXES: &[&str] = &["hi", "hello", "hey"];

const SUMMARY_KEYWORDS: &[&str] = &[
    "summar",
    "overview",
    "about",
    "tell me about",
    "what is this",
    "describe",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "tech stack",
    "technolog",
    "framework",
    "librar",
    "tool",
    "language",
    "skill",
];

const LIST_KEYWORDS: &[&str] = &["list", "name", "what are", "which", "mention"];

const PERSON_KEYWORDS: &[&str] = &[
    "who",
    "person",
    "student",
    "author",
    "supervisor",
    "professor",
];

const DETAIL_KEYWORDS: &[&str] = &[
    "detail",
    "explain",
    "elaborate",
    "process",
    "methodology",
];

const DOCUMENT_KEYWORDS: &[&str] = &[
    "pdf",
    "document",
    "file",
    "about",
    "tell me",
    "describe",
    "summarize",
    "what is",
    "overview",
    "what's this",
    "whats this",
    "explain this",
    "explain the",
];

type Rule = (fn(&str) -> bool, QueryIntent);

/// Evaluated top to bottom; order is significant
const RULES: &[Rule] = &[
    (is_greeting, QueryIntent::Greeting),
    (is_summary_request, QueryIntent::SummaryRequest),
    (is_technical_query, QueryIntent::TechnicalQuery),
    (is_list_query, QueryIntent::ListQuery),
    (is_person_query, QueryIntent::PersonQuery),
    (is_detail_query, QueryIntent::DetailQuery),
];

/// Classify a user message. Never fails; unmatched input is `General`.
pub fn classify(message: &str) -> QueryIntent {
    let cleaned = clean(message);
    RULES
        .iter()
        .find(|(matches, _)| matches(&cleaned))
        .map_or(QueryIntent::General, |(_, intent)| *intent)
}

/// Whether the message is about the document as a whole
pub fn is_document_question(message: &str) -> bool {
    contains_any(&clean(message), DOCUMENT_KEYWORDS)
}

fn clean(message: &str) -> String {
    message.trim().to_lowercase()
}

fn is_greeting(cleaned: &str) -> bool {
    let unpunctuated = cleaned
        .strip_suffix('.')
        .or_else(|| cleaned.strip_suffix('!'))
        .unwrap_or(cleaned);
    if GREETINGS.contains(&cleaned) || GREETINGS.contains(&unpunctuated) {
        return true;
    }

    let mut words = cleaned.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => GREETING_PREFIXES.iter().any(|p| word.starts_with(p)),
        _ => false,
    }
}

fn is_summary_request(cleaned: &str) -> bool {
    contains_any(cleaned, SUMMARY_KEYWORDS)
}

fn is_technical_query(cleaned: &str) -> bool {
    contains_any(cleaned, TECHNICAL_KEYWORDS)
        || contains_in_order(cleaned, "how", "built")
        || contains_in_order(cleaned, "what", "use")
}

fn is_list_query(cleaned: &str) -> bool {
    contains_any(cleaned, LIST_KEYWORDS)
}

fn is_person_query(cleaned: &str) -> bool {
    contains_any(cleaned, PERSON_KEYWORDS)
}

fn is_detail_query(cleaned: &str) -> bool {
    contains_any(cleaned, DETAIL_KEYWORDS) || contains_in_order(cleaned, "how", "work")
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// `first` occurs somewhere before a later `then`
fn contains_in_order(text: &str, first: &str, then: &str) -> bool {
    text.find(first)
        .is_some_and(|pos| text[pos + first.len()..].contains(then))
}
