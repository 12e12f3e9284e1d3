//! Handlers that expose the pure pipeline stages

use std::path::Path;

use crate::cli::output::print_info;
use crate::cli::output::print_warning;
use crate::cli::output::truncate_str;
use crate::embeddings::magnitude;
use crate::embeddings::EmbeddingService;
use crate::rag::classify;
use crate::rag::cosine_similarity;
use crate::rag::is_document_question;
use crate::rag::TextChunker;
use crate::AppConfig;
use crate::Result;

pub fn handle_chunk(
    config: &AppConfig,
    file: &Path,
    size: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let mut chunking = config.chunking.clone();
    if let Some(size) = size {
        chunking.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        chunking.chunk_overlap = overlap;
    }

    let chunks = TextChunker::from_config(&chunking).chunk(&text);
    if chunks.is_empty() {
        print_warning("No text to chunk");
        return Ok(());
    }

    print_info(&format!(
        "{} chunk(s) from {} chars (size {}, overlap {}, {:?})",
        chunks.len(),
        text.chars().count(),
        chunking.chunk_size,
        chunking.chunk_overlap,
        chunking.strategy
    ));
    for (idx, chunk) in chunks.iter().enumerate() {
        println!("\n--- chunk {} ({} chars) ---", idx, chunk.chars().count());
        println!("{chunk}");
    }
    Ok(())
}

pub fn handle_embed(config: &AppConfig, text: &str, compare: Option<&str>) -> Result<()> {
    let embedder = EmbeddingService::from_config(config);
    let vector = embedder.generate(text);
    let non_zero = vector.iter().filter(|x| **x != 0.0).count();

    print_info(&format!(
        "dimension {}, {} non-zero, magnitude {:.4}",
        vector.len(),
        non_zero,
        magnitude(&vector)
    ));
    let head: Vec<String> = vector.iter().take(8).map(|x| format!("{x:.4}")).collect();
    println!("   [{}, ...]", head.join(", "));

    if let Some(other) = compare {
        let similarity = cosine_similarity(&vector, &embedder.generate(other));
        println!(
            "   similarity to \"{}\": {:.4}",
            truncate_str(other, 40),
            similarity
        );
    }
    Ok(())
}

pub fn handle_classify(message: &str) -> Result<()> {
    println!("intent: {}", classify(message));
    println!("about the document: {}", is_document_question(message));
    Ok(())
}
