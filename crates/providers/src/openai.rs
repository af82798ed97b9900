//! OpenAI provider — the secondary answer lane.
//!
//! One chat-completions call with the full role-tagged segment list and a
//! single fixed model. No internal model fallback; lane-level fallback is
//! the gateway's job.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use streamlens_core::error::ProviderError;
use streamlens_core::prompt::{PromptSegment, Role};
use streamlens_core::provider::AnswerProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.3;

/// OpenAI chat-completions provider.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "openai".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Custom base URL (testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }
}

/// Render prompt segments into the chat-completions message shape.
fn to_api_messages(segments: &[PromptSegment]) -> Vec<ApiMessage> {
    segments
        .iter()
        .map(|segment| ApiMessage {
            role: match segment.role {
                Role::System => "system",
                Role::User => "user",
            },
            content: segment.content.clone(),
        })
        .collect()
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, segments: &[PromptSegment]) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": to_api_messages(segments),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        debug!(provider = "openai", model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid OpenAI API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::Api {
                status_code: 200,
                message: format!("Failed to parse OpenAI response: {e}"),
            })?;

        extract_answer(&self.model, api_resp)
    }
}

fn extract_answer(
    model: &str,
    response: ChatCompletionResponse,
) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ProviderError::EmptyCompletion(model.to_string()))
}

// --- OpenAI API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor() {
        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model, "gpt-4o-mini");
    }

    #[test]
    fn segments_keep_roles_on_the_wire() {
        let segments = vec![
            PromptSegment::system("instruction"),
            PromptSegment::user("context"),
            PromptSegment::user("Question: q"),
        ];
        let messages = to_api_messages(&segments);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].content, "Question: q");
    }

    #[test]
    fn extracts_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "An answer"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 3}
            }"#,
        )
        .unwrap();
        assert_eq!(extract_answer("m", response).unwrap(), "An answer");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_answer("gpt-4o-mini", response),
            Err(ProviderError::EmptyCompletion(_))
        ));
    }

    #[test]
    fn blank_content_is_an_error() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": ""}}]}"#,
        )
        .unwrap();
        assert!(extract_answer("m", response).is_err());
    }
}
