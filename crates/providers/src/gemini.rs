//! Gemini provider — the primary answer lane.
//!
//! Flattens the role-tagged prompt into one text blob and walks an ordered
//! list of model candidates: the configured model first, then a fixed
//! sequence of known-good names. The first successful generation wins; a
//! failed candidate is logged and the next one is tried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use streamlens_core::error::ProviderError;
use streamlens_core::prompt::{self, PromptSegment};
use streamlens_core::provider::AnswerProvider;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Known-good model names tried after the configured one.
const FALLBACK_MODELS: [&str; 4] = [
    "gemini-2.5-flash",
    "gemini-flash-latest",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash",
];

/// Gemini generateContent provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider preferring `model` ahead of the fixed candidates.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "gemini".into(),
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

    /// Ordered model candidates: configured model first, then the fixed
    /// fallback sequence, duplicates skipped.
    fn model_candidates(&self) -> Vec<&str> {
        let mut candidates = vec![self.model.as_str()];
        for model in FALLBACK_MODELS {
            if !candidates.contains(&model) {
                candidates.push(model);
            }
        }
        candidates
    }

    async fn generate_with_model(
        &self,
        model: &str,
        text: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": text }] }]
        });

        debug!(provider = "gemini", model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Gemini API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::Api {
                status_code: 200,
                message: format!("Failed to parse Gemini response: {e}"),
            })?;

        extract_text(model, api_resp)
    }
}

#[async_trait]
impl AnswerProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, segments: &[PromptSegment]) -> Result<String, ProviderError> {
        let text = prompt::flatten(segments);

        let mut last_error =
            ProviderError::NotConfigured("No Gemini model candidates".into());

        for model in self.model_candidates() {
            match self.generate_with_model(model, &text).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    warn!(model, error = %e, "Gemini model failed, trying next candidate");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Pull the answer text out of the first candidate's parts.
fn extract_text(
    model: &str,
    response: GenerateContentResponse,
) -> Result<String, ProviderError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ProviderError::EmptyCompletion(model.to_string()));
    }
    Ok(text)
}

// --- Gemini API types ---

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}
