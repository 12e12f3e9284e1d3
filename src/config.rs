use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::DocRagError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub backtrace: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            backtrace: false,
        }
    }
}

/// How extracted document text is cut into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Greedy sentence packing with a character overlap prefix
    #[default]
    Sentence,
    /// Fixed character windows advancing by `chunk_size - chunk_overlap`
    FixedStride,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    #[serde(default)]
    pub strategy: ChunkStrategy,
}

pub(crate) const fn default_chunk_size() -> usize {
    1000
}

pub(crate) const fn default_chunk_overlap() -> usize {
    200
}

pub(crate) const fn default_max_chunks() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_chunks: default_max_chunks(),
            strategy: ChunkStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Vector length used for both stored chunks and queries
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

pub(crate) const fn default_dimension() -> usize {
    128
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of chunks used when nothing clears the threshold
    #[serde(default = "default_fallback_k")]
    pub fallback_k: usize,
}

pub(crate) const fn default_similarity_threshold() -> f32 {
    0.01
}

pub(crate) const fn default_top_k() -> usize {
    5
}

pub(crate) const fn default_fallback_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
            fallback_k: default_fallback_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Turns inlined into grounded prompts
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Previous turns shown to the greeting prompt
    #[serde(default = "default_greeting_window")]
    pub greeting_window: usize,
}

pub(crate) const fn default_window_size() -> usize {
    4
}

pub(crate) const fn default_greeting_window() -> usize {
    2
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            greeting_window: default_greeting_window(),
        }
    }
}

/// Wire protocol spoken by the generation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// `/chat/completions` (OpenAI, Groq and compatible servers)
    #[default]
    OpenAI,
    /// Ollama `/api/generate`
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    /// Empty means read `GROQ_API_KEY` from the environment
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

pub(crate) const fn default_temperature() -> f32 {
    0.7
}

pub(crate) const fn default_max_tokens() -> u32 {
    1000
}

pub(crate) const fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default locations
    ///
    /// Tries `config.toml`, then `config.example.toml`, then built-in defaults.
    pub fn load() -> crate::Result<Self> {
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            tracing::debug!("No config file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if self.embeddings.dimension == 0 {
            return Err(DocRagError::ConfigError(
                "embeddings.dimension must be greater than 0".to_string(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(DocRagError::ConfigError(
                "chunking.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(DocRagError::ConfigError(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.chunking.max_chunks == 0 {
            return Err(DocRagError::ConfigError(
                "chunking.max_chunks must be greater than 0".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(DocRagError::ConfigError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        let threshold = self.retrieval.similarity_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(DocRagError::ConfigError(format!(
                "retrieval.similarity_threshold must be in [0, 1), got {threshold}"
            )));
        }
        Ok(())
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Resolve the LLM key, falling back to `GROQ_API_KEY`
    pub fn llm_key(&self) -> Option<String> {
        if self.llm.llm_key.is_empty() {
            std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty())
        } else {
            Some(self.llm.llm_key.clone())
        }
    }
}
