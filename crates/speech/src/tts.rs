//! Text-to-speech via the Cloud Text-to-Speech `text:synthesize` endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::info;
use zonewatch_config::SpeechConfig;
use zonewatch_core::error::SpeechError;

use crate::client::GoogleSpeechClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputEncoding {
    Mp3,
    Linear16,
    OggOpus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
    Neutral,
}

impl std::str::FromStr for VoiceGender {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FEMALE" => Ok(Self::Female),
            "MALE" => Ok(Self::Male),
            "NEUTRAL" => Ok(Self::Neutral),
            other => Err(SpeechError::NotConfigured(format!(
                "unknown voice gender '{other}' (expected FEMALE, MALE or NEUTRAL)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    #[serde(rename = "ssmlGender")]
    pub gender: VoiceGender,
}

impl VoiceSelection {
    pub fn from_speech_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            language_code: config.language_code.clone(),
            gender: config.voice_gender.parse()?,
        })
    }
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self {
            language_code: "en-US".into(),
            gender: VoiceGender::Female,
        }
    }
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text`, returning the encoded audio bytes.
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelection,
        encoding: OutputEncoding,
    ) -> Result<Vec<u8>, SpeechError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: SynthesisInput<'a>,
    voice: &'a VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: OutputEncoding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

fn decode_audio(response: SynthesizeResponse) -> Result<Vec<u8>, SpeechError> {
    if response.audio_content.is_empty() {
        return Err(SpeechError::ApiError {
            status_code: 200,
            message: "response carried no audioContent".into(),
        });
    }
    STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| SpeechError::ApiError {
            status_code: 200,
            message: format!("audioContent is not base64: {e}"),
        })
}

#[async_trait]
impl TextToSpeech for GoogleSpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelection,
        encoding: OutputEncoding,
    ) -> Result<Vec<u8>, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::Io("nothing to synthesize".into()));
        }
        let body = SynthesizeBody {
            input: SynthesisInput { text },
            voice,
            audio_config: AudioConfig {
                audio_encoding: encoding,
            },
        };
        let url = format!("{}/text:synthesize", self.tts_url);
        let response: SynthesizeResponse = self.post_json(url, &body).await?;
        let audio = decode_audio(response)?;
        info!(bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}
