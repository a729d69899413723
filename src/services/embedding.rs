//! Client for the remote embedding-generation API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, EmbeddingError};
use crate::models::require_env;

/// Environment variable holding the embedding endpoint URL.
pub const ENV_EMBED_ENDPOINT: &str = "genai_embed_endpoint";

/// Environment variable holding the embedding API key.
pub const ENV_EMBED_KEY: &str = "genai_embed_key";

/// Request body for the embedding endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
}

/// Response from the embedding endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Client for the embedding API. Failures are fatal; there is no retry.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl EmbeddingClient {
    /// Build a client from the `genai_embed_*` environment variables.
    pub fn from_env(timeout_secs: u64) -> Result<Self, AppError> {
        let endpoint = require_env(ENV_EMBED_ENDPOINT)?;
        let api_key = require_env(ENV_EMBED_KEY)?;
        Ok(Self::new(endpoint, api_key, timeout_secs)?)
    }

    pub fn new(
        endpoint: String,
        api_key: String,
        timeout_secs: u64,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Embed one batch of texts. The response must hold exactly one vector
    /// per input text, in input order, all of the same dimension.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&EmbedRequest { input: texts })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let body = response.text().await?;
        parse_embed_response(&body, texts.len())
    }
}

/// Parse and validate an embedding response body.
fn parse_embed_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let parsed: EmbedResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

    if parsed.data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            parsed.data.len()
        )));
    }

    let embeddings: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();

    if let Some(first) = embeddings.first() {
        if first.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "embedding has zero dimensions".to_string(),
            ));
        }
        if embeddings.iter().any(|e| e.len() != first.len()) {
            return Err(EmbeddingError::InvalidResponse(
                "embedding dimensions are not uniform".to_string(),
            ));
        }
    }

    Ok(embeddings)
}
