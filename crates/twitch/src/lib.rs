//! Twitch Helix `SessionResolver` implementation.
//!
//! Resolving a session window is two calls: a client-credentials token grant
//! against the id service, then a `/helix/streams` lookup with the fresh
//! token. The token is short-lived and re-acquired on every resolution; no
//! caching.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use streamlens_core::error::SessionError;
use streamlens_core::session::{SessionResolver, SessionWindow};

const DEFAULT_AUTH_BASE: &str = "https://id.twitch.tv";
const DEFAULT_HELIX_BASE: &str = "https://api.twitch.tv";

/// Twitch Helix client for live-status queries.
pub struct HelixClient {
    client_id: String,
    client_secret: String,
    auth_base: String,
    helix_base: String,
    client: reqwest::Client,
}

impl HelixClient {
    /// Create a client against the production Twitch endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_base: DEFAULT_AUTH_BASE.into(),
            helix_base: DEFAULT_HELIX_BASE.into(),
            client,
        }
    }

    /// Custom base URLs (testing or proxies).
    pub fn with_bases(mut self, auth_base: impl Into<String>, helix_base: impl Into<String>) -> Self {
        self.auth_base = auth_base.into().trim_end_matches('/').to_string();
        self.helix_base = helix_base.into().trim_end_matches('/').to_string();
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

    /// Acquire an app access token via the client-credentials grant.
    async fn app_token(&self) -> Result<String, SessionError> {
        let url = format!("{}/oauth2/token", self.auth_base);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Twitch token grant failed");
            return Err(SessionError::TokenAcquisition(format!(
                "status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::TokenAcquisition(format!("unparseable token response: {e}")))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SessionResolver for HelixClient {
    async fn resolve(&self, channel: &str) -> Result<SessionWindow, SessionError> {
        let token = self.app_token().await?;

        let url = format!("{}/helix/streams", self.helix_base);
        let response = self
            .client
            .get(&url)
            .query(&[("user_login", channel)])
            .header("Client-Id", &self.client_id)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Twitch Helix streams query failed");
            return Err(SessionError::LiveStatus {
                status_code: status,
                message: body,
            });
        }

        let streams: StreamsResponse = response.json().await.map_err(|e| {
            SessionError::LiveStatus {
                status_code: 200,
                message: format!("unparseable streams response: {e}"),
            }
        })?;

        let window = window_from_streams(channel, streams);
        debug!(channel, live = window.is_live(), "Session window resolved");
        Ok(window)
    }
}

/// An empty data array is a valid offline result, never an error.
fn window_from_streams(channel: &str, streams: StreamsResponse) -> SessionWindow {
    match streams.data.into_iter().next() {
        Some(stream) => SessionWindow::live(channel, stream.started_at),
        None => SessionWindow::offline(channel),
    }
}

// --- Twitch API types ---

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_defaults() {
        let client = HelixClient::new("client-id", "client-secret");
        assert_eq!(client.auth_base, DEFAULT_AUTH_BASE);
        assert_eq!(client.helix_base, DEFAULT_HELIX_BASE);
    }

    #[test]
    fn base_override_strips_trailing_slash() {
        let client = HelixClient::new("id", "secret")
            .with_bases("http://localhost:9001/", "http://localhost:9002/");
        assert_eq!(client.auth_base, "http://localhost:9001");
        assert_eq!(client.helix_base, "http://localhost:9002");
    }

    #[test]
    fn parses_token_response() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "abc123", "expires_in": 5011271, "token_type": "bearer"}"#)
                .unwrap();
        assert_eq!(token.access_token, "abc123");
    }

    #[test]
    fn live_stream_yields_live_window() {
        let streams: StreamsResponse = serde_json::from_str(
            r#"{"data": [{"id": "42", "user_login": "mychannel", "type": "live", "started_at": "2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();

        let window = window_from_streams("mychannel", streams);
        assert!(window.is_live());
        assert_eq!(window.started_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn empty_data_yields_offline_window() {
        let streams: StreamsResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let window = window_from_streams("mychannel", streams);
        assert!(!window.is_live());
        assert_eq!(window.channel, "mychannel");
    }

    #[test]
    fn missing_data_field_yields_offline_window() {
        let streams: StreamsResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!window_from_streams("mychannel", streams).is_live());
    }
}
