//! Configuration loading, validation, and management for ZoneWatch.
//!
//! Loads configuration from `./zonewatch.toml`, falling back to
//! `~/.zonewatch/config.toml`, with environment variable overrides.
//! Validates all settings at startup, before any index is built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default OpenAI-compatible endpoint for Gemini models.
pub const GEMINI_OPENAI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Base URL of a well-known OpenAI-compatible provider.
pub fn known_provider_url(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some(GEMINI_OPENAI_URL),
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM/embedding provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// "gemini" or "openai" (any OpenAI-compatible endpoint with `api_url`)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub rerank: RerankConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_embedding_model() -> String {
    "gemini-embedding-001".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_request_timeout() -> u64 {
    60
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("embedding_model", &self.embedding_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("paths", &self.paths)
            .field("index", &self.index)
            .field("retrieval", &self.retrieval)
            .field("rerank", &self.rerank)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .field("speech", &self.speech)
            .finish()
    }
}

/// Where zone reports, persisted indexes and summaries live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("DATAN")
}
fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}
fn default_summary_dir() -> PathBuf {
    PathBuf::from("summaries")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_dir: default_storage_dir(),
            summary_dir: default_summary_dir(),
        }
    }
}

impl PathsConfig {
    /// Create all three directories if they are missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.data_dir, &self.storage_dir, &self.summary_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// What to do when one zone fails to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Mark the zone unavailable and keep going
    #[default]
    Isolate,
    /// Stop initialization with the first error
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Chunk size in whitespace tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per semantic-search query
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,

    /// Chunks (or partial answers) combined per tree-summarize call
    #[serde(default = "default_summary_fanout")]
    pub summary_fanout: usize,

    #[serde(default)]
    pub on_zone_failure: FailurePolicy,

    /// Zones built at once during initialization
    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,
}

fn default_chunk_size() -> usize {
    1024
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_similarity_top_k() -> usize {
    2
}
fn default_summary_fanout() -> usize {
    4
}
fn default_build_concurrency() -> usize {
    1
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            similarity_top_k: default_similarity_top_k(),
            summary_fanout: default_summary_fanout(),
            on_zone_failure: FailurePolicy::default(),
            build_concurrency: default_build_concurrency(),
        }
    }
}

/// Zone tool retrieval: top-K by similarity, then rerank to top-N.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_k() -> usize {
    10
}
fn default_top_n() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// "cohere" or "none" (keep similarity order)
    #[serde(default = "default_rerank_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_rerank_model")]
    pub model: String,
}

fn default_rerank_provider() -> String {
    "cohere".into()
}
fn default_rerank_model() -> String {
    "rerank-v3.5".into()
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            provider: default_rerank_provider(),
            api_key: None,
            api_url: None,
            model: default_rerank_model(),
        }
    }
}

impl std::fmt::Debug for RerankConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub zone_max_iterations: u32,

    #[serde(default = "default_max_iterations")]
    pub dispatch_max_iterations: u32,

    /// Timeout for a single tool invocation
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_tool_timeout() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            zone_max_iterations: default_max_iterations(),
            dispatch_max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum upload request size in bytes
    #[serde(default = "default_upload_limit")]
    pub upload_limit_bytes: usize,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_upload_limit() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            upload_limit_bytes: default_upload_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth bearer token, used when no API key is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Billing project sent as `x-goog-user-project`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,

    #[serde(default = "default_record_seconds")]
    pub record_seconds: u64,

    #[serde(default = "default_voice_gender")]
    pub voice_gender: String,

    #[serde(default = "default_recording_path")]
    pub recording_path: PathBuf,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_language_code() -> String {
    "en-US".into()
}
fn default_sample_rate() -> u32 {
    16_000
}
fn default_record_seconds() -> u64 {
    5
}
fn default_voice_gender() -> String {
    "FEMALE".into()
}
fn default_recording_path() -> PathBuf {
    PathBuf::from("live_audio.wav")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output.mp3")
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            access_token: None,
            project_id: None,
            language_code: default_language_code(),
            sample_rate_hz: default_sample_rate(),
            record_seconds: default_record_seconds(),
            voice_gender: default_voice_gender(),
            recording_path: default_recording_path(),
            output_path: default_output_path(),
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &redact(&self.api_key))
            .field("access_token", &redact(&self.access_token))
            .field("project_id", &self.project_id)
            .field("language_code", &self.language_code)
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("record_seconds", &self.record_seconds)
            .field("voice_gender", &self.voice_gender)
            .field("recording_path", &self.recording_path)
            .field("output_path", &self.output_path)
            .finish()
    }
}

/// How the speech clients authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum SpeechCredentials {
    ApiKey(String),
    AccessToken(String),
}

impl std::fmt::Debug for SpeechCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
        }
    }
}

impl AppConfig {
    /// Load configuration from `./zonewatch.toml` or `~/.zonewatch/config.toml`,
    /// then apply environment overrides:
    /// - `ZONEWATCH_API_KEY`, `GEMINI_API_KEY`, `GOOGLE_API_KEY` (first found)
    /// - `ZONEWATCH_PROVIDER`, `ZONEWATCH_MODEL`
    /// - `COHERE_API_KEY`
    /// - `GOOGLE_CLOUD_API_KEY`, `GOOGLE_CLOUD_ACCESS_TOKEN`, `GOOGLE_CLOUD_PROJECT`
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from("zonewatch.toml");
        let path = if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        };
        Self::load_with_env(&path)
    }

    /// Load a specific file, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
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

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Keys already set in the file win over environment keys; provider and
    /// model variables always override.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("ZONEWATCH_API_KEY")
                .or_else(|| lookup("GEMINI_API_KEY"))
                .or_else(|| lookup("GOOGLE_API_KEY"));
        }
        if let Some(provider) = lookup("ZONEWATCH_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("ZONEWATCH_MODEL") {
            self.default_model = model;
        }
        if self.rerank.api_key.is_none() {
            self.rerank.api_key = lookup("COHERE_API_KEY");
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = lookup("GOOGLE_CLOUD_API_KEY");
        }
        if self.speech.access_token.is_none() {
            self.speech.access_token = lookup("GOOGLE_CLOUD_ACCESS_TOKEN");
        }
        if self.speech.project_id.is_none() {
            self.speech.project_id = lookup("GOOGLE_CLOUD_PROJECT");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".zonewatch")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.index.chunk_size == 0 {
            return Err(ConfigError::ValidationError("index.chunk_size must be > 0".into()));
        }

        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(ConfigError::ValidationError(
                "index.chunk_overlap must be smaller than index.chunk_size".into(),
            ));
        }

        if self.index.similarity_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "index.similarity_top_k must be >= 1".into(),
            ));
        }

        if self.index.summary_fanout < 2 {
            return Err(ConfigError::ValidationError(
                "index.summary_fanout must be >= 2".into(),
            ));
        }

        if self.index.build_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "index.build_concurrency must be >= 1".into(),
            ));
        }

        if self.retrieval.top_n == 0 || self.retrieval.top_k < self.retrieval.top_n {
            return Err(ConfigError::ValidationError(
                "retrieval requires top_k >= top_n >= 1".into(),
            ));
        }

        if !matches!(self.rerank.provider.as_str(), "cohere" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown rerank.provider '{}' (expected \"cohere\" or \"none\")",
                self.rerank.provider
            )));
        }

        if self.api_url.is_none() && known_provider_url(&self.default_provider).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "unknown default_provider '{}': set api_url or use gemini, openai or ollama",
                self.default_provider
            )));
        }

        if self.agent.zone_max_iterations == 0 || self.agent.dispatch_max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent iteration caps must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// The provider API key, or the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("ZONEWATCH_API_KEY (or GEMINI_API_KEY)"))
    }

    /// The rerank API key. `None` when reranking is disabled.
    pub fn require_rerank_key(&self) -> Result<Option<&str>, ConfigError> {
        if self.rerank.provider == "none" {
            return Ok(None);
        }
        self.rerank
            .api_key
            .as_deref()
            .map(Some)
            .ok_or(ConfigError::MissingCredential("COHERE_API_KEY"))
    }

    /// Everything an index build and chat session need, checked up front.
    pub fn check_build_credentials(&self) -> Result<(), ConfigError> {
        self.require_api_key()?;
        self.require_rerank_key()?;
        Ok(())
    }

    /// Speech credentials: API key first, then bearer token.
    pub fn speech_credentials(&self) -> Result<SpeechCredentials, ConfigError> {
        if let Some(key) = &self.speech.api_key {
            return Ok(SpeechCredentials::ApiKey(key.clone()));
        }
        if let Some(token) = &self.speech.access_token {
            return Ok(SpeechCredentials::AccessToken(token.clone()));
        }
        Err(ConfigError::MissingCredential(
            "GOOGLE_CLOUD_API_KEY (or GOOGLE_CLOUD_ACCESS_TOKEN)",
        ))
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            api_url: None,
            default_model: default_model(),
            embedding_model: default_embedding_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            paths: PathsConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            rerank: RerankConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
            speech: SpeechConfig::default(),
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

    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),
}

impl From<ConfigError> for zonewatch_core::Error {
    fn from(err: ConfigError) -> Self {
        zonewatch_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.5-flash");
        assert_eq!(config.paths.data_dir, PathBuf::from("DATAN"));
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.top_n, 5);
        assert_eq!(config.rerank.model, "rerank-v3.5");
        assert_eq!(config.index.on_zone_failure, FailurePolicy::Isolate);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.index.chunk_size, 1024);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn top_n_above_top_k_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 3;
        config.retrieval.top_n = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("top_k >= top_n"));

        config.retrieval.top_n = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.index.chunk_size = 100;
        config.index.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_rerank_provider_rejected() {
        let mut config = AppConfig::default();
        config.rerank.provider = "voyage".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_needs_api_url() {
        let mut config = AppConfig::default();
        config.default_provider = "gemnii".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gemnii"));

        config.api_url = Some("https://llm.internal.test/v1".into());
        assert!(config.validate().is_ok());

        config.api_url = None;
        config.default_provider = "ollama".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zonewatch.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gemini-2.5-pro"

[index]
chunk_size = 256
chunk_overlap = 32
on_zone_failure = "abort"

[rerank]
provider = "none"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gemini-2.5-pro");
        assert_eq!(config.index.chunk_size, 256);
        assert_eq!(config.index.similarity_top_k, 2);
        assert_eq!(config.index.on_zone_failure, FailurePolicy::Abort);
        assert_eq!(config.require_rerank_key().unwrap(), None);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zonewatch.toml");
        std::fs::write(&path, "index = 3").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply_in_priority_order() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "gem"),
            ("GOOGLE_API_KEY", "goog"),
            ("ZONEWATCH_MODEL", "gemini-2.0-flash"),
            ("COHERE_API_KEY", "co"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gem"));
        assert_eq!(config.default_model, "gemini-2.0-flash");
        assert_eq!(config.rerank.api_key.as_deref(), Some("co"));
        assert!(config.check_build_credentials().is_ok());
    }

    #[test]
    fn file_key_wins_over_env_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("ZONEWATCH_API_KEY", "from-env")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let config = AppConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("ZONEWATCH_API_KEY"));

        let mut config = AppConfig::default();
        config.api_key = Some("k".into());
        let err = config.check_build_credentials().unwrap_err();
        assert!(err.to_string().contains("COHERE_API_KEY"));

        let err = config.speech_credentials().unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CLOUD_API_KEY"));
    }

    #[test]
    fn speech_prefers_api_key_over_token() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("GOOGLE_CLOUD_ACCESS_TOKEN", "tok"),
            ("GOOGLE_CLOUD_API_KEY", "key"),
        ]));
        assert_eq!(
            config.speech_credentials().unwrap(),
            SpeechCredentials::ApiKey("key".into())
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("super-secret".into());
        config.rerank.api_key = Some("cohere-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("cohere-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            data_dir: dir.path().join("DATAN"),
            storage_dir: dir.path().join("storage"),
            summary_dir: dir.path().join("summaries"),
        };
        paths.ensure_dirs().unwrap();
        assert!(paths.data_dir.is_dir());
        assert!(paths.storage_dir.is_dir());
        assert!(paths.summary_dir.is_dir());
    }
}
