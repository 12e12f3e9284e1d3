//! Chat handlers over an in-memory document and session store

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::output::print_error;
use crate::cli::output::print_info;
use crate::cli::output::print_reply;
use crate::llm::LlmService;
use crate::models::Document;
use crate::rag::ChatService;
use crate::session::SessionManager;
use crate::store::InMemoryDocumentStore;
use crate::AppConfig;
use crate::DocRagError;
use crate::Result;

const LOCAL_USER: &str = "local";

fn build_service(config: &AppConfig) -> Result<ChatService> {
    let generator = LlmService::new(config)?;
    info!("Using model {} at {}", generator.model(), config.llm_endpoint());
    Ok(ChatService::new(
        config,
        Arc::new(generator),
        Arc::new(InMemoryDocumentStore::new()),
        SessionManager::in_memory(),
    ))
}

async fn load_document(service: &ChatService, user: &str, file: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(file)?;
    let filename = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let document = service.add_document(user, &filename, &text).await?;
    print_info(&format!(
        "Loaded {} ({} chunks)",
        document.filename,
        document.chunks.len()
    ));
    Ok(document)
}

pub async fn handle_ask(
    config: &AppConfig,
    file: &Path,
    question: &str,
    show_chunks: bool,
) -> Result<()> {
    let service = build_service(config)?;
    let document = load_document(&service, LOCAL_USER, file).await?;
    let reply = service.ask(LOCAL_USER, &document.id, question).await?;
    print_reply(&reply, show_chunks);
    Ok(())
}

pub async fn handle_chat(config: &AppConfig, file: &Path, user: &str) -> Result<()> {
    let service = build_service(config)?;
    let document = load_document(&service, user, file).await?;
    println!("Ask about {}. Commands: /history, /quit", document.filename);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\nyou> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                for turn in service.history(user, &document.id).await? {
                    println!("{}: {}", turn.role, turn.content);
                }
            }
            message => match service.ask(user, &document.id, message).await {
                Ok(reply) => print_reply(&reply, false),
                Err(DocRagError::InvalidInput(reason)) => print_error(&reason),
                Err(e) => return Err(e),
            },
        }
    }

    Ok(())
}
