//! OpenAI HTTP client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use docrag_core::{
    EmbeddingProvider, GenerationConfig, GenerationResult, LLMProvider, Error, Result,
};

use crate::config::OpenAIConfig;

/// OpenAI client for embeddings and chat completions
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: Client,
}

#[derive(Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub(crate) input: &'a [String],
    pub(crate) model: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub(crate) data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingData {
    pub(crate) embedding: Vec<f32>,
    pub(crate) index: usize,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub(crate) role: &'a str,
    pub(crate) content: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: Vec<ChatMessage<'a>>,
    pub(crate) max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub(crate) choices: Vec<ChatChoice>,
    #[serde(default)]
    pub(crate) usage: Option<Usage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub(crate) message: ChatReply,
}

#[derive(Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct Usage {
    pub(crate) total_tokens: u32,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client from configuration
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new OpenAI client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model used for embeddings
    pub fn with_embedding_model(mut self, model_id: impl Into<String>) -> Self {
        self.config.embedding_model = model_id.into();
        self
    }

    /// Set the model used for chat completions
    pub fn with_chat_model(mut self, model_id: impl Into<String>) -> Self {
        self.config.chat_model = model_id.into();
        self
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url, path)
    }

    /// POST a JSON body and return the raw response text of a successful call
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        failure: fn(String) -> Error,
    ) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, &text, failure));
        }

        Ok(text)
    }

    /// Perform the actual chat completion request
    async fn perform_generation(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        let request = ChatRequest {
            model: &config.model_id,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let body = self
            .post_json("chat/completions", &request, Error::LLMProvider)
            .await?;
        let response: ChatResponse = serde_json::from_str(&body)?;

        let text = parse_chat_text(&response)?;

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used: response.usage.map(|u| u.total_tokens),
        })
    }
}

/// Map an unsuccessful HTTP status to an error, preferring the API's own message
fn status_error(status: StatusCode, body: &str, failure: fn(String) -> Error) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("OpenAI rejected the API key ({}): {}", status, message))
        }
        _ => failure(format!("OpenAI API request failed with status {}: {}", status, message)),
    }
}

/// Order embeddings by their `index` and check that every input got exactly one
pub(crate) fn parse_embeddings(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(Error::Embedding(format!(
            "Expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::Embedding(
            "Embedding response indices do not match the request".to_string(),
        ));
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

pub(crate) fn parse_chat_text(response: &ChatResponse) -> Result<String> {
    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::LLMProvider("Empty response from chat completion".to_string()));
    }

    Ok(text.to_string())
}

#[async_trait]
impl EmbeddingProvider for OpenAIClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Requesting {} embeddings from {}",
            texts.len(),
            self.config.embedding_model
        );

        let request = EmbeddingRequest {
            input: texts,
            model: &self.config.embedding_model,
        };

        let body = self
            .post_json("embeddings", &request, Error::Embedding)
            .await?;
        let response: EmbeddingResponse = serde_json::from_str(&body)?;

        parse_embeddings(response, texts.len())
    }

    fn model_id(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.config.chat_model.clone(),
            timeout: self.config.timeout,
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Chat completion request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.chat_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let parsed = parse_embeddings(
            response(r#"{"data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ], "model": "text-embedding-3-small"}"#),
            2,
        )
        .unwrap();

        assert_eq!(parsed, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn short_embedding_response_is_an_error() {
        let result = parse_embeddings(
            response(r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#),
            2,
        );
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let result = parse_embeddings(
            response(r#"{"data": [
                {"index": 0, "embedding": [1.0]},
                {"index": 0, "embedding": [2.0]}
            ]}"#),
            2,
        );
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn status_errors_use_api_message() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, body, Error::Embedding);
        assert_eq!(
            err.to_string(),
            "Embedding error: OpenAI API request failed with status 429 Too Many Requests: Rate limit reached"
        );

        let err = status_error(StatusCode::UNAUTHORIZED, "not json", Error::Embedding);
        assert!(matches!(err, Error::Authentication(msg) if msg.ends_with("not json")));
    }

    #[test]
    fn chat_text_is_trimmed() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "  Use the Close Job screen.\n"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 6, "total_tokens": 16}}"#,
        )
        .unwrap();

        assert_eq!(parse_chat_text(&response).unwrap(), "Use the Close Job screen.");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(16));
    }

    #[test]
    fn missing_chat_content_is_an_error() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#).unwrap();
        assert!(parse_chat_text(&response).is_err());
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        let client = OpenAIClient::new(OpenAIConfig::new("test_key".to_string())).unwrap();
        let vectors = client.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
