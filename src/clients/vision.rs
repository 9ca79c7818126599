use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::UsageRecord;

/// A preprocessed image, base64-encoded exactly once per invocation and
/// shared read-only across the four classifier calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    base64: String,
}

impl EncodedImage {
    #[must_use]
    pub fn new(base64: String) -> Self {
        Self { base64 }
    }

    fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }
}

/// Classifier-level failure taxonomy. None of these is fatal to a triage
/// invocation; the orchestrator degrades to safe defaults instead.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("classifier endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("classifier returned an empty response")]
    EmptyResponse,
    #[error("classifier response payload was not deserializable: {0}")]
    InvalidPayload(#[source] reqwest::Error),
}

/// Raw reply from one classifier call: untrusted free text plus token usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub raw_text: String,
    pub usage: UsageRecord,
}

/// Thin client for an OpenAI-compatible chat-completions endpoint.
///
/// 画像は data URL として添付し、temperature 0 で決定的なサンプリングを行う。
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl VisionClient {
    /// # Errors
    /// HTTPクライアントの構築、またはベースURLのパースに失敗した場合はエラーを返す。
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("failed to build vision client")?;
        let endpoint = Url::parse(&base_url.into())
            .and_then(|base| base.join("v1/chat/completions"))
            .context("invalid vision API base URL")?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base_url: impl Into<String>) -> Self {
        let endpoint = Url::parse(&base_url.into())
            .unwrap()
            .join("v1/chat/completions")
            .unwrap();
        Self {
            client: Client::new(),
            endpoint,
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
        }
    }

    /// Send one classification request: a fixed instruction prompt plus one or
    /// more image attachments, expecting a flat JSON object back as free text.
    ///
    /// # Errors
    /// タイムアウト、トランスポートエラー、エラーステータス、空レスポンスの
    /// 場合は [`ClassifierError`] を返す。
    pub async fn classify(
        &self,
        prompt: &str,
        images: &[EncodedImage],
        max_completion_tokens: u32,
    ) -> Result<ChatReply, ClassifierError> {
        let mut content = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        for image in images {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                    detail: "low".to_string(),
                },
            });
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_completion_tokens,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Transport(error)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(ClassifierError::InvalidPayload)?;

        let usage = parsed.usage.map(UsageRecord::from).unwrap_or_default();
        let raw_text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ClassifierError::EmptyResponse)?;

        debug!(total_tokens = usage.total_tokens, "classifier reply received");

        Ok(ChatReply { raw_text, usage })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<ChatUsage> for UsageRecord {
    fn from(usage: ChatUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image() -> EncodedImage {
        EncodedImage::new("aGVsbG8=".to_string())
    }

    #[tokio::test]
    async fn classify_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"soil\": \"깨끗\"}"}}],
                "usage": {"prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10}
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new_for_test(server.uri());
        let reply = client
            .classify("soil prompt", &[image()], 100)
            .await
            .expect("classify should succeed");

        assert_eq!(reply.raw_text, "{\"soil\": \"깨끗\"}");
        assert_eq!(reply.usage.total_tokens, 10);
    }

    #[tokio::test]
    async fn classify_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = VisionClient::new_for_test(server.uri());
        let error = client
            .classify("soil prompt", &[image()], 100)
            .await
            .expect_err("should fail on 503");

        assert!(matches!(error, ClassifierError::Status(status) if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn classify_treats_null_content_as_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": null}}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 0, "total_tokens": 5}
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new_for_test(server.uri());
        let error = client
            .classify("damage prompt", &[image()], 100)
            .await
            .expect_err("null content should be an empty response");

        assert!(matches!(error, ClassifierError::EmptyResponse));
    }

    #[tokio::test]
    async fn classify_defaults_missing_usage_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"damage\": \"없음\"}"}}]
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new_for_test(server.uri());
        let reply = client
            .classify("damage prompt", &[image()], 100)
            .await
            .expect("classify should succeed");

        assert_eq!(reply.usage, UsageRecord::default());
    }
}
