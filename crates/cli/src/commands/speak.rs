//! `zonewatch speak` — Synthesize speech to MP3 and play it.

use super::{CmdResult, load_config};
use std::path::PathBuf;
use tracing::warn;
use zonewatch_core::error::SpeechError;
use zonewatch_speech::{
    DEFAULT_TTS_TEXT, GoogleSpeechClient, VoiceSelection, play_file, synthesize_to_file,
};

pub async fn run(text: Option<String>, output: Option<PathBuf>, no_play: bool) -> CmdResult {
    let config = load_config()?;
    let client = GoogleSpeechClient::from_config(&config)?;
    let voice = VoiceSelection::from_speech_config(&config.speech)?;

    let text = text.unwrap_or_else(|| DEFAULT_TTS_TEXT.to_string());
    let output = output.unwrap_or_else(|| config.speech.output_path.clone());

    synthesize_to_file(&client, &text, &voice, &output).await?;
    println!("  Audio content written to file \"{}\"", output.display());

    if no_play {
        return Ok(());
    }
    match tokio::task::spawn_blocking(move || play_file(&output)).await? {
        Ok(()) => {}
        Err(SpeechError::AudioUnavailable) => {
            warn!("Playback skipped: built without the `audio` feature");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
