/// HTTP embedding client for OpenAI-compatible `/embeddings` endpoints.
///
/// The only module that talks to a remote embedding service. Batches all
/// texts of one call into a single request and retries 429/5xx responses
/// with exponential backoff. The orchestrator's timeout bounds the total.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EmbeddingProvider, ProviderError};

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_MS: u64 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingClient {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "embedding request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let mut builder = self.client.post(&self.url).json(&body);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = match builder.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!(%status, "embedding API returned a retryable status");
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            let text = response.text().await?;

            if !status.is_success() {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: api_error_message(text),
                });
            }

            let vectors = parse_embeddings(&text, texts.len())?;
            debug!(inputs = texts.len(), model = %self.model, "embedding request succeeded");
            return Ok(vectors);
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Unavailable(format!("no response after {MAX_RETRIES} attempts"))
        }))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors.pop().ok_or(ProviderError::Incomplete {
            expected: 1,
            got: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

/// Vectors in input order. Servers may return `data` in any order.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, ProviderError> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)?;
    if response.data.len() != expected {
        return Err(ProviderError::Incomplete {
            expected,
            got: response.data.len(),
        });
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

/// Nested `error.message` when the body is an API error envelope.
pub(crate) fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
