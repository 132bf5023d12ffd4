use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::RankingClient;
use super::RankingError;
use crate::config::{DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS};

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, RankingError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RankingError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default endpoint and model, key from `OPENAI_API_KEY`.
    ///
    /// Returns `None` when the key is not set, so callers can surface a
    /// configuration problem instead of failing on the first request.
    pub fn from_env() -> Option<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::new(
                DEFAULT_CHAT_BASE_URL,
                &key,
                DEFAULT_CHAT_MODEL,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )
            .ok(),
            _ => {
                tracing::debug!("OPENAI_API_KEY not set; ranking client unavailable");
                None
            }
        }
    }

    /// The model name being used.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

#[async_trait]
impl RankingClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, RankingError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RankingError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    RankingError::HttpClient(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    RankingError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RankingError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RankingError::Format(format!("chat response decode: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

/// Mock ranking client for tests: replays scripted replies in order,
/// repeating the last one once the script runs out.
#[derive(Clone)]
pub struct MockRankingClient {
    responses: Arc<Vec<String>>,
    cursor: Arc<AtomicUsize>,
}

impl MockRankingClient {
    pub fn new(response: &str) -> Self {
        Self::scripted(vec![response.to_string()])
    }

    pub fn scripted(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one reply");
        Self {
            responses: Arc::new(responses),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times `complete` has been invoked.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingClient for MockRankingClient {
    async fn complete(&self, _prompt: &str) -> Result<String, RankingError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .responses
            .get(index)
            .unwrap_or_else(|| self.responses.last().expect("non-empty script"));
        Ok(reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", "sk-test", "gpt-4o-mini", 60)
            .unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn chat_request_serializes_to_expected_wire_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "rank these",
            }],
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "rank these");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn chat_response_tolerates_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn mock_client_replays_script_then_repeats_last() {
        let mock = MockRankingClient::scripted(vec!["first".into(), "second".into()]);
        assert_eq!(mock.complete("p").await.unwrap(), "first");
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        assert_eq!(mock.complete("p").await.unwrap(), "second");
        assert_eq!(mock.calls(), 3);
    }
}
