//! Local audio I/O: microphone capture to WAV and file playback.
//!
//! Device access is behind the `audio` feature. Without it, [`record_wav`]
//! and [`play_file`] return [`SpeechError::AudioUnavailable`]. The sample
//! conversion helpers are always available.

use std::path::Path;
use std::time::Duration;
use zonewatch_core::error::SpeechError;

/// Average interleaved frames down to one channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampling of a mono signal.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (samples.len() as f64 * ratio).floor() as usize;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 / ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}

/// Convert `[-1.0, 1.0]` floats to signed 16-bit PCM, clipping overshoot.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}

/// Record `duration` from the default input device into a mono 16-bit WAV
/// at `sample_rate`. Blocks the calling thread.
pub fn record_wav(path: &Path, duration: Duration, sample_rate: u32) -> Result<(), SpeechError> {
    #[cfg(feature = "audio")]
    {
        device::record_wav(path, duration, sample_rate)
    }
    #[cfg(not(feature = "audio"))]
    {
        let _ = (path, duration, sample_rate);
        Err(SpeechError::AudioUnavailable)
    }
}

/// Play an audio file (MP3, WAV, ...) on the default output device until it
/// finishes. Blocks the calling thread.
pub fn play_file(path: &Path) -> Result<(), SpeechError> {
    #[cfg(feature = "audio")]
    {
        device::play_file(path)
    }
    #[cfg(not(feature = "audio"))]
    {
        let _ = path;
        Err(SpeechError::AudioUnavailable)
    }
}

#[cfg(feature = "audio")]
mod device {
    use super::*;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample};
    use std::sync::{Arc, Mutex};
    use tracing::{info, warn};

    type Captured = Arc<Mutex<Vec<f32>>>;

    fn audio_err(context: &str, e: impl std::fmt::Display) -> SpeechError {
        SpeechError::Audio(format!("{context}: {e}"))
    }

    fn input_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        captured: Captured,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = captured.lock() {
                    buf.extend(data.iter().map(|s| f32::from_sample(*s)));
                }
            },
            |err| warn!(error = %err, "Input stream error"),
            None,
        )
    }

    pub(super) fn record_wav(
        path: &Path,
        duration: Duration,
        sample_rate: u32,
    ) -> Result<(), SpeechError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SpeechError::Audio("no input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| audio_err("input config", e))?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels as usize;
        let device_rate = config.sample_rate.0;

        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let stream = match format {
            cpal::SampleFormat::F32 => input_stream::<f32>(&device, &config, captured.clone()),
            cpal::SampleFormat::I16 => input_stream::<i16>(&device, &config, captured.clone()),
            cpal::SampleFormat::U16 => input_stream::<u16>(&device, &config, captured.clone()),
            other => {
                return Err(SpeechError::Audio(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }
        .map_err(|e| audio_err("input stream", e))?;

        info!(seconds = duration.as_secs_f32(), device_rate, channels, "Recording");
        stream.play().map_err(|e| audio_err("start capture", e))?;
        std::thread::sleep(duration);
        drop(stream);

        let raw = captured
            .lock()
            .map_err(|_| SpeechError::Audio("capture buffer poisoned".into()))?
            .clone();
        let mono = downmix(&raw, channels);
        let pcm = to_pcm16(&resample_linear(&mono, device_rate, sample_rate));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| SpeechError::Io(e.to_string()))?;
        for sample in &pcm {
            writer
                .write_sample(*sample)
                .map_err(|e| SpeechError::Io(e.to_string()))?;
        }
        writer.finalize().map_err(|e| SpeechError::Io(e.to_string()))?;

        info!(path = %path.display(), samples = pcm.len(), "Recording saved");
        Ok(())
    }

    pub(super) fn play_file(path: &Path) -> Result<(), SpeechError> {
        let file = std::fs::File::open(path).map_err(|e| SpeechError::Io(e.to_string()))?;
        let (_stream, handle) =
            rodio::OutputStream::try_default().map_err(|e| audio_err("output device", e))?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| audio_err("sink", e))?;
        let source = rodio::Decoder::new(std::io::BufReader::new(file))
            .map_err(|e| audio_err("decode", e))?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}
