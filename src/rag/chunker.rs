//! Document chunking
//!
//! Two strategies are available. `Sentence` (the default) packs whole
//! sentences into chunks of at most `chunk_size` characters and then
//! prefixes every chunk but the first with the trailing `chunk_overlap`
//! characters of its predecessor. `FixedStride` cuts plain character
//! windows. The two do not produce the same chunks for the same text.
//!
//! Sizes are measured in characters, not bytes.

use tracing::debug;
use tracing::warn;

use crate::config;
use crate::config::ChunkStrategy;
use crate::config::ChunkingConfig;

/// Splits extracted document text into ordered, overlapping chunks
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    max_chunks: usize,
    strategy: ChunkStrategy,
}

impl TextChunker {
    /// Create a sentence-aware chunker
    ///
    /// `overlap` is clamped below `chunk_size`, and `chunk_size` to at least 1.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            max_chunks: config::default_max_chunks(),
            strategy: ChunkStrategy::Sentence,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
            .with_max_chunks(config.max_chunks)
            .with_strategy(config.strategy)
    }

    #[must_use]
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Chunk `text`. Empty or whitespace-only text yields no chunks.
    ///
    /// Every returned chunk is trimmed and non-empty; at most `max_chunks`
    /// are returned, dropping from the tail.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chunks = match self.strategy {
            ChunkStrategy::Sentence => {
                let segments = self.segments(text);
                with_overlap(&segments, self.overlap)
            }
            ChunkStrategy::FixedStride => self.fixed_stride(text),
        };

        debug!(
            "Chunked {} chars into {} chunks ({:?})",
            text.chars().count(),
            chunks.len(),
            self.strategy
        );
        chunks
    }

    /// Sentence-packed segments before overlap is applied, capped at `max_chunks`
    pub fn segments(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0;

        for sentence in split_sentences(text) {
            for piece in split_oversized(&sentence, self.chunk_size) {
                let piece_chars = piece.chars().count();
                if buffer.is_empty() {
                    buffer = piece;
                    buffer_chars = piece_chars;
                } else if buffer_chars + 1 + piece_chars > self.chunk_size {
                    segments.push(std::mem::replace(&mut buffer, piece));
                    buffer_chars = piece_chars;
                } else {
                    buffer.push(' ');
                    buffer.push_str(&piece);
                    buffer_chars += 1 + piece_chars;
                }
            }
        }
        if !buffer.is_empty() {
            segments.push(buffer);
        }

        if segments.len() > self.max_chunks {
            warn!(
                "Document produced {} chunks, keeping the first {}",
                segments.len(),
                self.max_chunks
            );
            segments.truncate(self.max_chunks);
        }
        segments
    }

    fn fixed_stride(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let stride = (self.chunk_size - self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                if chunks.len() == self.max_chunks {
                    warn!("Fixed-stride chunking hit the cap of {} chunks", self.max_chunks);
                    break;
                }
                chunks.push(trimmed.to_string());
            }
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

/// Sentence-aware chunking with default limits
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    TextChunker::new(chunk_size, overlap).chunk(text)
}

/// Split on `.`, `!`, `?` runs followed by whitespace or end of text
///
/// Whitespace inside each sentence is collapsed to single spaces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !is_terminator(c) {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            current.push(next);
            chars.next();
        }
        if chars.peek().map_or(true, |next| next.is_whitespace()) {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);

    sentences
}

const fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let collapsed = raw.split_whitespace().collect::<Vec<&str>>().join(" ");
    if !collapsed.is_empty() {
        sentences.push(collapsed);
    }
}

/// Break a sentence longer than `limit` into word-packed pieces
///
/// A single word longer than `limit` becomes its own piece.
fn split_oversized(sentence: &str, limit: usize) -> Vec<String> {
    if sentence.chars().count() <= limit {
        return vec![sentence.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_chars = 0;
    for word in sentence.split(' ') {
        let word_chars = word.chars().count();
        if piece.is_empty() {
            piece.push_str(word);
            piece_chars = word_chars;
        } else if piece_chars + 1 + word_chars > limit {
            pieces.push(std::mem::replace(&mut piece, word.to_string()));
            piece_chars = word_chars;
        } else {
            piece.push(' ');
            piece.push_str(word);
            piece_chars += 1 + word_chars;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Prefix each segment after the first with the tail of its predecessor
fn with_overlap(segments: &[String], overlap: usize) -> Vec<String> {
    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            if idx == 0 || overlap == 0 {
                return segment.trim().to_string();
            }
            let tail = tail_chars(&segments[idx - 1], overlap);
            format!("{} {}", tail.trim(), segment).trim().to_string()
        })
        .collect()
}

fn tail_chars(text: &str, n: usize) -> &str {
    let total = text.chars().count();
    if total <= n {
        return text;
    }
    let skip = total - n;
    text.char_indices()
        .nth(skip)
        .map_or(text, |(byte_idx, _)| &text[byte_idx..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("   \n\t ", 100, 10).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let text = "The project uses React and Node.js. It was supervised by Dr. Smith.";
        let chunks = chunk_text(text, 1000, 200);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two!  Three?? four\nfive. v1.2 stays");
        assert_eq!(
            sentences,
            vec!["One.", "Two!", "Three??", "four five.", "v1.2 stays"]
        );
    }

    #[test]
    fn test_sentences_are_packed_greedily() {
        let chunker = TextChunker::new(21, 0);
        let segments = chunker.segments("Aaaa bbbb. Cccc dddd. Eeee ffff. Gggg.");
        assert_eq!(
            segments,
            vec!["Aaaa bbbb. Cccc dddd.", "Eeee ffff. Gggg."]
        );
    }

    #[test]
    fn test_segments_cover_all_words() {
        let text = "Alpha beta gamma. Delta epsilon! Zeta eta theta? Iota kappa lambda mu. \
                    Nu xi omicron pi. Rho sigma tau upsilon phi chi psi omega.";
        let chunker = TextChunker::new(30, 10);
        let joined = chunker.segments(text).join(" ");
        assert_eq!(words(&joined), words(text));
    }

    #[test]
    fn test_overlap_prefixes_previous_tail() {
        let chunker = TextChunker::new(20, 5);
        let text = "Aaaa bbbb. Cccc dddd. Eeee ffff. Gggg.";
        let segments = chunker.segments(text);
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), segments.len());
        assert_eq!(chunks[0], segments[0]);
        for idx in 1..chunks.len() {
            assert!(chunks[idx].ends_with(&segments[idx]));
            let tail = tail_chars(&segments[idx - 1], 5).trim();
            assert!(chunks[idx].starts_with(tail));
        }
    }

    #[test]
    fn test_oversized_sentence_is_split_on_words() {
        let chunker = TextChunker::new(10, 0);
        let segments = chunker.segments("one two three four five six");
        assert!(segments.iter().all(|s| s.chars().count() <= 10));
        assert_eq!(words(&segments.join(" ")), words("one two three four five six"));
    }

    #[test]
    fn test_chunks_are_trimmed_and_non_empty() {
        let text = "  First sentence here.   \n\n  Second one follows!  Third?  ";
        for strategy in [ChunkStrategy::Sentence, ChunkStrategy::FixedStride] {
            let chunker = TextChunker::new(15, 4).with_strategy(strategy);
            for chunk in chunker.chunk(text) {
                assert!(!chunk.is_empty());
                assert_eq!(chunk, chunk.trim());
            }
        }
    }

    #[test]
    fn test_chunk_cap_drops_tail() {
        let text = (0..50)
            .map(|i| format!("Sentence number {i}."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunker = TextChunker::new(20, 0).with_max_chunks(5);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], "Sentence number 0.");
    }

    #[test]
    fn test_fixed_stride_windows() {
        let chunker = TextChunker::new(4, 1).with_strategy(ChunkStrategy::FixedStride);
        assert_eq!(chunker.chunk("abcdefghij"), vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_fixed_stride_respects_cap() {
        let chunker = TextChunker::new(2, 0)
            .with_strategy(ChunkStrategy::FixedStride)
            .with_max_chunks(3);
        assert_eq!(chunker.chunk("aabbccddee"), vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let chunker = TextChunker::new(4, 10).with_strategy(ChunkStrategy::FixedStride);
        // stride of 1 instead of an endless loop
        assert_eq!(chunker.chunk("abcde"), vec!["abcd", "bcde"]);
    }

    #[test]
    fn test_tail_chars_multibyte() {
        assert_eq!(tail_chars("naïve café", 4), "café");
        assert_eq!(tail_chars("ab", 5), "ab");
    }
}
