//! Shared HTTP plumbing for the Google Cloud speech REST APIs.

use std::time::Duration;
use tracing::warn;
use zonewatch_config::{AppConfig, SpeechCredentials};
use zonewatch_core::error::SpeechError;

pub const SPEECH_API_URL: &str = "https://speech.googleapis.com/v1";
pub const TTS_API_URL: &str = "https://texttospeech.googleapis.com/v1";

/// An authenticated client for `speech.googleapis.com` and
/// `texttospeech.googleapis.com`.
pub struct GoogleSpeechClient {
    pub(crate) stt_url: String,
    pub(crate) tts_url: String,
    credentials: SpeechCredentials,
    project_id: Option<String>,
    pub(crate) http: reqwest::Client,
}

impl GoogleSpeechClient {
    pub fn new(
        credentials: SpeechCredentials,
        project_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self {
            stt_url: SPEECH_API_URL.to_string(),
            tts_url: TTS_API_URL.to_string(),
            credentials,
            project_id,
            http,
        })
    }

    /// Credentials, project and timeout from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, SpeechError> {
        let credentials = config
            .speech_credentials()
            .map_err(|e| SpeechError::NotConfigured(e.to_string()))?;
        Self::new(
            credentials,
            config.speech.project_id.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_urls(mut self, stt_url: impl Into<String>, tts_url: impl Into<String>) -> Self {
        self.stt_url = stt_url.into().trim_end_matches('/').to_string();
        self.tts_url = tts_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attach the API key or bearer token, and the billing project if set.
    pub(crate) fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = match &self.credentials {
            SpeechCredentials::ApiKey(key) => builder.query(&[("key", key)]),
            SpeechCredentials::AccessToken(token) => builder.bearer_auth(token),
        };
        match &self.project_id {
            Some(project) => builder.header("x-goog-user-project", project),
            None => builder,
        }
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<B, R>(&self, url: String, body: &B) -> Result<R, SpeechError>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %message, "Speech API returned error");
            return Err(SpeechError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SpeechError::ApiError {
                status_code: status.as_u16(),
                message: format!("malformed response: {e}"),
            })
    }
}
