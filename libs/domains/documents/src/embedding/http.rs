use std::time::Duration;

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, ConfigError, FromEnv};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::{check_batch, Vectorizer};
use crate::error::{DocumentError, DocumentResult};

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Settings for an OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Known output dimension; probed from the server when `None`
    pub dimension: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            dimension: None,
            timeout_secs: 30,
        }
    }
}

impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let dimension = env_optional("EMBEDDING_DIMENSION")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| ConfigError::ParseError {
                        key: "EMBEDDING_DIMENSION".to_string(),
                        details: e.to_string(),
                    })
            })
            .transpose()?;

        Ok(Self {
            base_url: env_or_default("EMBEDDING_BASE_URL", DEFAULT_EMBEDDING_URL),
            model: env_or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            api_key: env_optional("EMBEDDING_API_KEY").or_else(|| env_optional("OPENAI_API_KEY")),
            dimension,
            ..Self::default()
        })
    }
}

impl EmbeddingConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Vectorizer backed by an OpenAI-compatible embeddings server
pub struct HttpEmbedder {
    client: Client,
    config: EmbeddingConfig,
    dimension: usize,
}

impl HttpEmbedder {
    /// Build the embedder, asking the server for its output dimension
    /// unless the config already names one.
    pub async fn connect(config: EmbeddingConfig) -> DocumentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocumentError::Embedding(format!("Failed to build client: {}", e)))?;

        let dimension = match config.dimension {
            Some(dimension) => dimension,
            None => {
                let probe = request_embeddings(&client, &config, &["dimension probe".to_string()])
                    .await?;
                let dimension = probe.first().map(Vec::len).unwrap_or(0);
                tracing::info!(model = %config.model, dimension, "Probed embedding dimension");
                dimension
            }
        };
        if dimension == 0 {
            return Err(DocumentError::Embedding(
                "Embedding model reported an empty vector".to_string(),
            ));
        }

        Ok(Self {
            client,
            config,
            dimension,
        })
    }

    pub async fn from_env() -> DocumentResult<Self> {
        Self::connect(EmbeddingConfig::from_env()?).await
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

async fn request_embeddings(
    client: &Client,
    config: &EmbeddingConfig,
    texts: &[String],
) -> DocumentResult<Vec<Vec<f32>>> {
    let mut request = client
        .post(format!("{}/embeddings", config.base_url.trim_end_matches('/')))
        .json(&EmbeddingRequest {
            model: &config.model,
            input: texts,
        });
    if let Some(api_key) = &config.api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| DocumentError::Embedding(format!("Embedding request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(DocumentError::Embedding(format!(
            "Embedding API error ({}): {}",
            status, error_text
        )));
    }

    let body: EmbeddingResponse = response
        .json()
        .await
        .map_err(|e| DocumentError::Embedding(format!("Malformed embedding response: {}", e)))?;

    // Sort by index to maintain order
    let mut data = body.data;
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Vectorizer for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let vectors = request_embeddings(&self.client, &self.config, texts).await?;
        check_batch(&vectors, texts.len(), self.dimension)?;
        tracing::debug!(model = %self.config.model, count = vectors.len(), "Encoded texts");
        Ok(vectors)
    }
}
