/// HTTP narrator for OpenAI-compatible `/chat/completions` endpoints.
///
/// Same retry policy as the embedding client: 429/5xx responses are retried
/// with exponential backoff, anything else fails fast. The orchestrator's
/// timeout bounds the whole call.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompts::{build_narrative_prompt, NARRATIVE_SYSTEM};
use super::{FeedbackProvider, NarrativeRequest};
use crate::similarity::http::api_error_message;
use crate::similarity::ProviderError;

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_MS: u64 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 400;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpChatClient {
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

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: NARRATIVE_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "chat completion failed, retrying"
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
                warn!(%status, "chat API returned a retryable status");
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

            let summary = parse_completion(&text)?;
            debug!(model = %self.model, chars = summary.len(), "chat completion succeeded");
            return Ok(summary);
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Unavailable(format!("no response after {MAX_RETRIES} attempts"))
        }))
    }
}

#[async_trait]
impl FeedbackProvider for HttpChatClient {
    fn name(&self) -> &'static str {
        "http-chat"
    }

    async fn summarize(&self, request: &NarrativeRequest) -> Result<String, ProviderError> {
        self.complete(&build_narrative_prompt(request)).await
    }
}

/// Text of the first choice, trimmed. Blank replies count as empty content.
fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(ProviderError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_takes_first_choice() {
        let body = r#"{"choices":[
            {"message":{"role":"assistant","content":"  Strong Python fit.  "}},
            {"message":{"role":"assistant","content":"ignored"}}
        ]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Strong Python fit.");
    }

    #[test]
    fn test_parse_completion_rejects_blank_or_missing_content() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            assert!(matches!(parse_completion(body), Err(ProviderError::EmptyContent)), "{body}");
        }
    }

    #[test]
    fn test_parse_completion_malformed_json() {
        assert!(matches!(parse_completion("not json"), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_new_client_keeps_model() {
        let client = HttpChatClient::new("http://localhost:9/v1/chat/completions", "m", None).unwrap();
        assert_eq!(client.model, "m");
        assert_eq!(client.name(), "http-chat");
    }
}
