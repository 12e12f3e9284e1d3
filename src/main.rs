use clap::Parser;
use docrag::cli::handle_ask;
use docrag::cli::handle_chat;
use docrag::cli::handle_chunk;
use docrag::cli::handle_classify;
use docrag::cli::handle_embed;
use docrag::cli::Cli;
use docrag::cli::Commands;
use docrag::config::AppConfig;
use docrag::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    if cli.verbose {
        docrag::logging::init_logging_with_level("debug")?;
    } else {
        docrag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Chunk {
            file,
            size,
            overlap,
        } => handle_chunk(&config, &file, size, overlap)?,
        Commands::Embed { text, compare } => handle_embed(&config, &text, compare.as_deref())?,
        Commands::Classify { message } => handle_classify(&message)?,
        Commands::Ask {
            file,
            question,
            show_chunks,
        } => handle_ask(&config, &file, &question, show_chunks).await?,
        Commands::Chat { file, user } => handle_chat(&config, &file, &user).await?,
    }

    Ok(())
}
