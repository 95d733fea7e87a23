//! Speech front end for ZoneWatch.
//!
//! Speech-to-text and text-to-speech go through the Google Cloud REST APIs.
//! Microphone capture and playback are local and need the `audio` feature.

pub mod audio;
pub mod client;
pub mod stt;
pub mod tts;

use std::path::Path;
use tracing::info;
use zonewatch_core::error::SpeechError;

pub use audio::{play_file, record_wav};
pub use client::GoogleSpeechClient;
pub use stt::{InputEncoding, RecognitionConfig, SpeechToText};
pub use tts::{OutputEncoding, TextToSpeech, VoiceGender, VoiceSelection};

/// Spoken when `speak` is run without text.
pub const DEFAULT_TTS_TEXT: &str = "You are a zone safety classifier agent for a public event. \
You will be given descriptions of 4 different zones based on video analysis. \
Each description contains an estimate of crowd density, movement quality, \
and estimated number of people.";

/// Read a recording from disk and transcribe it.
pub async fn transcribe_file(
    stt: &dyn SpeechToText,
    path: &Path,
    config: &RecognitionConfig,
) -> Result<Vec<String>, SpeechError> {
    let audio = tokio::fs::read(path)
        .await
        .map_err(|e| SpeechError::Io(format!("{}: {e}", path.display())))?;
    stt.recognize(&audio, config).await
}

/// Synthesize `text` as MP3 and write it to `path`.
pub async fn synthesize_to_file(
    tts: &dyn TextToSpeech,
    text: &str,
    voice: &VoiceSelection,
    path: &Path,
) -> Result<(), SpeechError> {
    let audio = tts.synthesize(text, voice, OutputEncoding::Mp3).await?;
    tokio::fs::write(path, &audio)
        .await
        .map_err(|e| SpeechError::Io(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = audio.len(), "Audio content written");
    Ok(())
}
