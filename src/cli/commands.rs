//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(about = "Ask grounded questions about a text document")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a text file into chunks and print them
    Chunk {
        /// Text file to chunk
        file: PathBuf,
        /// Override the configured chunk size (characters)
        #[arg(long)]
        size: Option<usize>,
        /// Override the configured overlap (characters)
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Embed a text and print a summary of the vector
    Embed {
        /// Text to embed
        text: String,
        /// Also compare against this text
        #[arg(long)]
        compare: Option<String>,
    },
    /// Print the intent of a message
    Classify {
        /// Message to classify
        message: String,
    },
    /// Load a text file and answer one question about it
    Ask {
        /// Text file to load
        file: PathBuf,
        /// Question about the file
        question: String,
        /// Print the retrieved chunk previews
        #[arg(long)]
        show_chunks: bool,
    },
    /// Load a text file and chat about it interactively
    Chat {
        /// Text file to load
        file: PathBuf,
        /// User id the session is kept under
        #[arg(long, default_value = "local")]
        user: String,
    },
}
