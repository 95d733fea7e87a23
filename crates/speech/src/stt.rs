//! Speech-to-text via the Cloud Speech `speech:recognize` endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zonewatch_config::SpeechConfig;
use zonewatch_core::error::SpeechError;

use crate::client::GoogleSpeechClient;

/// Input encodings accepted by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputEncoding {
    /// Uncompressed signed 16-bit little-endian PCM (WAV payloads included).
    Linear16,
    Flac,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: InputEncoding,
    #[serde(rename = "sampleRateHertz")]
    pub sample_rate_hz: u32,
    pub language_code: String,
}

impl RecognitionConfig {
    pub fn from_speech_config(config: &SpeechConfig) -> Self {
        Self {
            encoding: InputEncoding::Linear16,
            sample_rate_hz: config.sample_rate_hz,
            language_code: config.language_code.clone(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            encoding: InputEncoding::Linear16,
            sample_rate_hz: 16_000,
            language_code: "en-US".into(),
        }
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe `audio`, returning the top alternative of each result.
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<String>, SpeechError>;
}

#[derive(Serialize)]
struct RecognizeBody<'a> {
    config: &'a RecognitionConfig,
    audio: AudioContent,
}

#[derive(Serialize)]
struct AudioContent {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

fn recognize_body<'a>(audio: &[u8], config: &'a RecognitionConfig) -> RecognizeBody<'a> {
    RecognizeBody {
        config,
        audio: AudioContent {
            content: STANDARD.encode(audio),
        },
    }
}

fn transcripts(response: RecognizeResponse) -> Vec<String> {
    response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript)
        .collect()
}

#[async_trait]
impl SpeechToText for GoogleSpeechClient {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<String>, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::Io("audio payload is empty".into()));
        }
        debug!(bytes = audio.len(), rate = config.sample_rate_hz, "Recognizing speech");

        let url = format!("{}/speech:recognize", self.stt_url);
        let response: RecognizeResponse = self.post_json(url, &recognize_body(audio, config)).await?;
        let lines = transcripts(response);
        info!(results = lines.len(), "Speech recognized");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_matches_wire_format() {
        let config = RecognitionConfig::default();
        let body = serde_json::to_value(recognize_body(b"abc", &config)).unwrap();
        assert_eq!(body["config"]["encoding"], "LINEAR16");
        assert_eq!(body["config"]["sampleRateHertz"], 16000);
        assert_eq!(body["config"]["languageCode"], "en-US");
        assert_eq!(body["audio"]["content"], "YWJj");
    }

    #[test]
    fn takes_first_alternative_of_each_result() {
        let response: RecognizeResponse = serde_json::from_str(
            r#"{"results":[
                {"alternatives":[{"transcript":"north gate is crowded","confidence":0.9},{"transcript":"north gate is loud"}]},
                {"alternatives":[]},
                {"alternatives":[{"transcript":"send stewards"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(transcripts(response), vec!["north gate is crowded", "send stewards"]);
    }

    #[test]
    fn silence_yields_no_results() {
        let response: RecognizeResponse = serde_json::from_str("{}").unwrap();
        assert!(transcripts(response).is_empty());
    }

    #[test]
    fn config_follows_speech_settings() {
        let mut speech = SpeechConfig::default();
        speech.sample_rate_hz = 8000;
        speech.language_code = "en-GB".into();
        let config = RecognitionConfig::from_speech_config(&speech);
        assert_eq!(config.sample_rate_hz, 8000);
        assert_eq!(config.language_code, "en-GB");
    }

    #[tokio::test]
    async fn empty_audio_is_rejected_before_any_request() {
        let client = GoogleSpeechClient::new(
            zonewatch_config::SpeechCredentials::ApiKey("k".into()),
            None,
            std::time::Duration::from_secs(1),
        )
        .unwrap()
        .with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9");
        let err = client.recognize(&[], &RecognitionConfig::default()).await.unwrap_err();
        assert!(matches!(err, SpeechError::Io(_)));
    }
}
