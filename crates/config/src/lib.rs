//! Configuration loading and validation for streamlens.
//!
//! Loads configuration from `~/.streamlens/config.toml` with environment
//! variable overrides for credentials and deployment knobs. Loaded once at
//! startup, validated, and passed by reference from there on — no ambient
//! global lookup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use streamlens_core::MessageLimits;

/// The root configuration structure.
///
/// Maps directly to `~/.streamlens/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Answer provider lanes and model names
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Twitch Helix credentials
    #[serde(default)]
    pub twitch: TwitchConfig,

    /// Chat log store (DynamoDB) settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Bounds on per-request message retrieval
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Outbound HTTP timeouts
    #[serde(default)]
    pub http: HttpConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("providers", &self.providers)
            .field("twitch", &self.twitch)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .field("limits", &self.limits)
            .field("http", &self.http)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Prefer the Gemini lane when its key is present
    #[serde(default = "default_true")]
    pub use_gemini: bool,

    /// Gemini model tried first, ahead of the fixed fallback candidates
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Fixed model for the OpenAI lane
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

fn default_true() -> bool {
    true
}
fn default_gemini_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            use_gemini: true,
            gemini_model: default_gemini_model(),
            openai_model: default_openai_model(),
            gemini_api_key: None,
            openai_api_key: None,
        }
    }
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("use_gemini", &self.use_gemini)
            .field("gemini_model", &self.gemini_model)
            .field("openai_model", &self.openai_model)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TwitchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl TwitchConfig {
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl std::fmt::Debug for TwitchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// DynamoDB table holding the chat log
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Endpoint override (local DynamoDB); defaults to the regional endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_table() -> String {
    "twitch_chat_logs".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("table", &self.table)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allow-origin; `*` allows any origin
    #[serde(default = "default_cors_origin")]
    pub cors_allow_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}
fn default_cors_origin() -> String {
    "*".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,

    #[serde(default = "default_default_messages")]
    pub default_messages: usize,

    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_min_messages() -> usize {
    200
}
fn default_default_messages() -> usize {
    2000
}
fn default_max_messages() -> usize {
    6000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_messages: default_min_messages(),
            default_messages: default_default_messages(),
            max_messages: default_max_messages(),
        }
    }
}

impl LimitsConfig {
    pub fn message_limits(&self) -> MessageLimits {
        MessageLimits {
            min: self.min_messages,
            default: self.default_messages,
            max: self.max_messages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for Twitch and store calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for answer-provider calls (generation is slow)
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_provider_timeout() -> u64 {
    120
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.streamlens/config.toml).
    ///
    /// Environment variables override file values for everything that is a
    /// deployment concern or a secret:
    /// `GEMINI_API_KEY`, `OPENAI_API_KEY`, `TWITCH_CLIENT_ID`,
    /// `TWITCH_CLIENT_SECRET`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// `AWS_SESSION_TOKEN`, `AWS_REGION`, `CHAT_TABLE`, `USE_GEMINI`,
    /// `GEMINI_MODEL`, `CORS_ALLOW_ORIGIN`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.providers.gemini_api_key = Some(key);
        } else if let Ok(key) = std::env::var("GOOGLE_GEMINI_KEY") {
            self.providers.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.providers.openai_api_key = Some(key);
        }
        // Empty/unset keeps the configured preference
        if let Ok(flag) = std::env::var("USE_GEMINI") {
            if !flag.trim().is_empty() {
                self.providers.use_gemini = flag.trim().eq_ignore_ascii_case("true");
            }
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.providers.gemini_model = model;
        }

        if let Ok(id) = std::env::var("TWITCH_CLIENT_ID") {
            self.twitch.client_id = Some(id);
        }
        if let Ok(secret) = std::env::var("TWITCH_CLIENT_SECRET") {
            self.twitch.client_secret = Some(secret);
        }

        if let Ok(key) = std::env::var("AWS_ACCESS_KEY_ID") {
            self.store.access_key_id = Some(key);
        }
        if let Ok(key) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            self.store.secret_access_key = Some(key);
        }
        if let Ok(token) = std::env::var("AWS_SESSION_TOKEN") {
            self.store.session_token = Some(token);
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.store.region = region;
        }
        if let Ok(table) = std::env::var("CHAT_TABLE") {
            self.store.table = table;
        }

        if let Ok(origin) = std::env::var("CORS_ALLOW_ORIGIN") {
            self.gateway.cors_allow_origin = origin;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".streamlens")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.min_messages == 0 {
            return Err(ConfigError::ValidationError(
                "limits.min_messages must be at least 1".into(),
            ));
        }
        if limits.min_messages > limits.max_messages {
            return Err(ConfigError::ValidationError(
                "limits.min_messages must not exceed limits.max_messages".into(),
            ));
        }
        if limits.default_messages < limits.min_messages
            || limits.default_messages > limits.max_messages
        {
            return Err(ConfigError::ValidationError(
                "limits.default_messages must lie within [min_messages, max_messages]".into(),
            ));
        }
        if self.http.request_timeout_secs == 0 || self.http.provider_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http timeouts must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Whether any answer provider credential is present.
    pub fn has_answer_credentials(&self) -> bool {
        self.providers.gemini_api_key.is_some() || self.providers.openai_api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            twitch: TwitchConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
            limits: LimitsConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
