//! HTTP client for chat-completion style generation endpoints

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::TextGenerator;
use crate::config::AppConfig;
use crate::config::LlmProvider;
use crate::errors::DocRagError;
use crate::errors::Result;

/// Generation client, built once and shared
pub struct LlmService {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl LlmService {
    /// Create a client from configuration
    ///
    /// # Errors
    /// - HTTP client build errors (invalid TLS setup)
    /// - Missing API key for an OpenAI-compatible provider
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config.llm_key();
        if config.llm.provider == LlmProvider::OpenAI && api_key.is_none() {
            return Err(DocRagError::ConfigError(
                "llm.llm_key is empty and GROQ_API_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DocRagError::HttpError(e.to_string()))?;

        Ok(Self {
            provider: config.llm.provider,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            model: config.llm_model().to_string(),
            api_key,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate using an OpenAI-compatible `/chat/completions` endpoint
    async fn generate_openai(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DocRagError::ConfigError("LLM API key not provided".to_string()))?;

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({})", url, self.model);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DocRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocRagError::LlmError(format!(
                "Chat completions API error ({status}): {error_text}"
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DocRagError::LlmError(format!("Failed to parse response: {e}")))?;

        extract_completion(body)
    }

    /// Generate using Ollama `/api/generate`
    async fn generate_ollama(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        debug!("Calling Ollama generate API: {} ({})", url, self.model);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DocRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocRagError::LlmError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| DocRagError::LlmError(format!("Failed to parse response: {e}")))?;

        non_empty(body.response)
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => self.generate_openai(prompt).await,
            LlmProvider::Ollama => self.generate_ollama(prompt).await,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

fn extract_completion(body: ChatCompletionResponse) -> Result<String> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| DocRagError::LlmError("No choices in response".to_string()))?;
    non_empty(content)
}

fn non_empty(content: String) -> Result<String> {
    if content.trim().is_empty() {
        return Err(DocRagError::LlmError("Empty completion".to_string()));
    }
    Ok(content)
}
