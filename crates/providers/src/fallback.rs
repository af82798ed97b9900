//! Lane fallback — ordered attempt chain over answer providers.
//!
//! The gateway tries each enabled lane in precedence order and returns the
//! first success. Failures are plain `Err` values inspected by the loop, not
//! raised-and-caught control flow; the last failure is kept to describe a
//! total exhaustion.

use std::sync::Arc;

use streamlens_config::AppConfig;
use streamlens_core::error::ProviderError;
use streamlens_core::prompt::PromptSegment;
use streamlens_core::provider::AnswerProvider;
use tracing::{info, warn};

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

/// An ordered chain of answer lanes.
pub struct AnswerGateway {
    lanes: Vec<Arc<dyn AnswerProvider>>,
}

impl AnswerGateway {
    /// Create a gateway with no lanes.
    pub fn new() -> Self {
        Self { lanes: Vec::new() }
    }

    /// Append a lane to the chain.
    pub fn add(mut self, lane: Arc<dyn AnswerProvider>) -> Self {
        self.lanes.push(lane);
        self
    }

    /// Number of enabled lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether any lane is enabled.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Generate an answer through the first lane that succeeds.
    ///
    /// An empty chain is a configuration error, distinct from generation
    /// failure; exhausting all lanes returns the last lane's error.
    pub async fn generate(&self, prompt: &[PromptSegment]) -> Result<String, ProviderError> {
        if self.lanes.is_empty() {
            return Err(ProviderError::NotConfigured(
                "No AI API key configured. Set GEMINI_API_KEY or OPENAI_API_KEY.".into(),
            ));
        }

        let mut last_error = None;

        for (i, lane) in self.lanes.iter().enumerate() {
            info!(
                lane = %lane.name(),
                attempt = i + 1,
                total = self.lanes.len(),
                "Trying answer lane"
            );

            match lane.generate(prompt).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    warn!(lane = %lane.name(), error = %e, "Answer lane failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        // lanes is non-empty, so at least one error was recorded
        Err(last_error.expect("exhausted a non-empty lane chain"))
    }
}

impl Default for AnswerGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the lane chain from configuration.
///
/// Gemini leads when it is both selected and credentialed; OpenAI joins
/// whenever its key is present. An unconfigured chain stays empty and
/// surfaces as `NotConfigured` on first use.
pub fn build_from_config(config: &AppConfig) -> AnswerGateway {
    let providers = &config.providers;
    let timeout = std::time::Duration::from_secs(config.http.provider_timeout_secs);
    let mut gateway = AnswerGateway::new();

    if providers.use_gemini {
        if let Some(key) = &providers.gemini_api_key {
            gateway = gateway.add(Arc::new(
                GeminiProvider::new(key, &providers.gemini_model).with_timeout(timeout),
            ));
        }
    }

    if let Some(key) = &providers.openai_api_key {
        gateway = gateway.add(Arc::new(
            OpenAiProvider::new(key, &providers.openai_model).with_timeout(timeout),
        ));
    }

    gateway
}
