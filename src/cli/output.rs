//! CLI output formatting utilities

use crate::rag::ChatReply;
use crate::rag::ChunkPreview;

/// Safely truncate a string at character boundary (not byte boundary)
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    crate::models::preview(s, max_chars)
}

pub fn print_info(message: &str) {
    println!("ℹ️  {message}");
}

pub fn print_warning(message: &str) {
    eprintln!("⚠️  {message}");
}

pub fn print_error(message: &str) {
    eprintln!("❌ {message}");
}

/// Print chunk previews with their scores
pub fn print_chunk_previews(previews: &[ChunkPreview]) {
    if previews.is_empty() {
        println!("   (no document context used)");
        return;
    }
    for preview in previews {
        println!(
            "   [{}] score {:.3}: {}",
            preview.id,
            preview.score,
            truncate_str(&preview.text.replace('\n', " "), 100)
        );
    }
}

/// Print an answer with its source tag
pub fn print_reply(reply: &ChatReply, show_chunks: bool) {
    println!("\n{}\n", reply.answer);
    println!("📎 source: {}", reply.source);
    if show_chunks {
        print_chunk_previews(&reply.relevant_chunks);
    }
    if let Some(diagnostic) = &reply.diagnostic {
        print_warning(&format!("generation failed: {diagnostic}"));
    }
}
