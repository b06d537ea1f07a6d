//! Ollama LLM implementation
//!
//! Talks to the Ollama HTTP API directly (`/api/chat`, `/api/embed`) so
//! native tool calling and embeddings share one client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionRequest, Llm, LlmError, Message, ToolCall, ToolDefinition};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    stream: bool,
    options: ChatOptions,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Response from the Ollama chat endpoint
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama client over direct HTTP
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(url: &str, model: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: normalize_base_url(url),
            model: model.to_string(),
            embedding_model: model.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(300),
        }
    }

    /// Use a dedicated model for embeddings
    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| LlmError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LlmError::Transport { url, source })?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Llm for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(Message::system(request.system.clone()));
        }
        messages.extend(request.messages.iter().cloned());

        let body = ChatRequest {
            model: &self.model,
            messages,
            tools: &request.tools,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = request.tools.len(),
            "Sending chat request"
        );

        let raw = self.post("/api/chat", &body).await?;
        let response: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| LlmError::Decode(e.to_string()))?;

        tracing::debug!(
            content_len = response.message.content.len(),
            tool_calls = response.message.tool_calls.len(),
            "Chat response received"
        );

        Ok(Completion {
            text: response.message.content,
            tool_calls: response.message.tool_calls,
        })
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let raw = self.post("/api/embed", &body).await?;
        let response: EmbedResponse =
            serde_json::from_str(&raw).map_err(|e| LlmError::Decode(e.to_string()))?;

        if response.embeddings.len() != inputs.len() {
            return Err(LlmError::Decode(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Reduce a configured URL to `scheme://host:port`, falling back to the local default
fn normalize_base_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("localhost");
            let port = url.port().unwrap_or(11434);
            format!("{}://{}:{}", url.scheme(), host, port)
        }
        Err(e) => {
            tracing::warn!(url = %raw, error = %e, "Invalid Ollama URL, using default");
            DEFAULT_BASE_URL.to_string()
        }
    }
}
