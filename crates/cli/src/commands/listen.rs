//! `zonewatch listen` — Record or read speech and transcribe it.

use super::{CmdResult, load_config};
use std::path::PathBuf;
use std::time::Duration;
use zonewatch_speech::{GoogleSpeechClient, RecognitionConfig, record_wav, transcribe_file};

pub async fn run(file: Option<PathBuf>, seconds: Option<u64>) -> CmdResult {
    let config = load_config()?;
    let client = GoogleSpeechClient::from_config(&config)?;
    let recognition = RecognitionConfig::from_speech_config(&config.speech);

    let path = match file {
        Some(path) => path,
        None => {
            let path = config.speech.recording_path.clone();
            let duration = Duration::from_secs(seconds.unwrap_or(config.speech.record_seconds));
            let rate = config.speech.sample_rate_hz;
            println!("  🎙  Recording for {} seconds...", duration.as_secs());
            let target = path.clone();
            tokio::task::spawn_blocking(move || record_wav(&target, duration, rate)).await??;
            println!("  Recording finished: {}", path.display());
            path
        }
    };

    let transcripts = transcribe_file(&client, &path, &recognition).await?;
    if transcripts.is_empty() {
        println!("  (no speech recognized)");
        return Ok(());
    }
    for line in &transcripts {
        println!("  Transcript: {line}");
    }

    Ok(())
}
