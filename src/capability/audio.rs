use crate::error::SessionError;
use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::mpsc;
use tracing::info;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Microphone capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sample rate of the recorded buffer
    pub sample_rate: u32,
    /// Channel count of the recorded buffer (1 = mono)
    pub channels: u16,
    /// Frame size in milliseconds
    pub buffer_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// A locally buffered, playable audio resource
///
/// Cloning shares the bytes; the buffer is freed with its last owner.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    bytes: Arc<[u8]>,
    mime: String,
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AudioBuffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    /// Encode PCM samples as an in-memory WAV file
    pub fn from_pcm(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for &sample in samples {
                writer.write_sample(sample).context("Failed to write sample")?;
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        Ok(Self::new(cursor.into_inner(), "audio/wav"))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Probe container and codec parameters
    pub fn probe(&self) -> Result<AudioInfo, SessionError> {
        let source = Cursor::new(self.bytes.to_vec());
        let stream = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension_for(&self.mime) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| SessionError::SynthesisFailure(format!("unplayable audio: {}", e)))?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| SessionError::SynthesisFailure("audio has no playable track".into()))?;

        let params = &track.codec_params;
        let duration = match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => {
                Some(Duration::from_secs_f64(frames as f64 / rate as f64))
            }
            _ => None,
        };

        Ok(AudioInfo {
            sample_rate: params.sample_rate,
            channels: params.channels.map(|c| c.count() as u16),
            duration,
        })
    }
}

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/flac" => Some("flac"),
        _ => None,
    }
}

/// What [`AudioBuffer::probe`] found out
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub duration: Option<Duration>,
}

/// Something that feeds raw microphone frames
pub trait FrameSource: Send + Sync {
    /// Open the device and start delivering frames
    fn open(&self, config: &CaptureConfig) -> Result<mpsc::Receiver<AudioFrame>, SessionError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Replays a WAV file as if it were the microphone
pub struct WavFileSource {
    path: PathBuf,
}

impl WavFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FrameSource for WavFileSource {
    fn open(&self, config: &CaptureConfig) -> Result<mpsc::Receiver<AudioFrame>, SessionError> {
        info!("Opening audio file: {}", self.path.display());

        let reader = WavReader::open(&self.path).map_err(|e| {
            SessionError::PermissionDenied(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::PermissionDenied(format!("cannot read samples: {}", e)))?;

        let frame_len = ((spec.sample_rate as u64 * config.buffer_duration_ms / 1000) as usize
            * spec.channels as usize)
            .max(1);
        let frames: Vec<AudioFrame> = samples
            .chunks(frame_len)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                timestamp_ms: i as u64 * config.buffer_duration_ms,
            })
            .collect();

        info!(
            "Audio file loaded: {}Hz, {} channels, {} frames",
            spec.sample_rate,
            spec.channels,
            frames.len()
        );

        let (tx, rx) = mpsc::channel(frames.len().max(1));
        for frame in frames {
            // Capacity matches the frame count, so this never waits
            if tx.try_send(frame).is_err() {
                break;
            }
        }

        Ok(rx)
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

/// Delivers silent frames in real time
#[derive(Debug, Default)]
pub struct SilenceSource;

impl FrameSource for SilenceSource {
    fn open(&self, config: &CaptureConfig) -> Result<mpsc::Receiver<AudioFrame>, SessionError> {
        let (tx, rx) = mpsc::channel(16);
        let config = config.clone();

        tokio::spawn(async move {
            let frame_len =
                (config.sample_rate as u64 * config.buffer_duration_ms / 1000) as usize * config.channels as usize;
            let mut ticker = tokio::time::interval(Duration::from_millis(config.buffer_duration_ms.max(1)));
            let mut timestamp_ms = 0;

            loop {
                ticker.tick().await;
                let frame = AudioFrame {
                    samples: vec![0; frame_len],
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += config.buffer_duration_ms;
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "silence"
    }
}

/// Bring a frame to the configured rate and channel layout
pub fn normalize_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    if processed.sample_rate != target_sample_rate {
        processed = resample_frame(processed, target_sample_rate);
    }

    if processed.channels != target_channels && target_channels == 1 {
        processed = stereo_to_mono(processed);
    }

    processed
}

/// Resample by linear interpolation between neighbouring frames
fn resample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if target_rate == 0 || frame.sample_rate == 0 || frame.sample_rate == target_rate {
        return frame;
    }

    let channels = frame.channels.max(1) as usize;
    let in_frames = frame.samples.len() / channels;
    let out_frames = ((in_frames as u64 * target_rate as u64 + frame.sample_rate as u64 / 2)
        / frame.sample_rate as u64) as usize;
    let step = frame.sample_rate as f64 / target_rate as f64;

    let mut resampled = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let pos = i as f64 * step;
        let idx = (pos.floor() as usize).min(in_frames - 1);
        let next = (idx + 1).min(in_frames - 1);
        let frac = pos - idx as f64;

        for ch in 0..channels {
            let a = frame.samples[idx * channels + ch] as f64;
            let b = frame.samples[next * channels + ch] as f64;
            resampled.push((a + (b - a) * frac).round() as i16);
        }
    }

    AudioFrame {
        samples: resampled,
        sample_rate: target_rate,
        ..frame
    }
}

/// Sum left and right channels, clamped
fn stereo_to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels != 2 {
        return frame;
    }

    let mono_samples: Vec<i16> = frame
        .samples
        .chunks_exact(2)
        .map(|pair| {
            let sum = pair[0] as i32 + pair[1] as i32;
            sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect();

    AudioFrame {
        samples: mono_samples,
        channels: 1,
        ..frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<i16>, sample_rate: u32, channels: u16) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate,
            channels,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_resample_keeps_whole_frames() {
        let stereo = frame(vec![1, -1, 2, -2, 3, -3, 4, -4, 5, -5, 6, -6], 48000, 2);
        let out = resample_frame(stereo, 16000);

        assert_eq!(out.sample_rate, 16000);
        assert_eq!(out.samples, vec![1, -1, 4, -4]);
    }

    #[test]
    fn test_stereo_to_mono_clamps() {
        let stereo = frame(vec![i16::MAX, 10, 100, 200], 16000, 2);
        let out = stereo_to_mono(stereo);

        assert_eq!(out.channels, 1);
        assert_eq!(out.samples, vec![i16::MAX, 300]);
    }

    #[test]
    fn test_normalize_for_recognition() {
        let out = normalize_frame(frame(vec![10, 20, 30, 40, 50, 60], 48000, 2), 16000, 1);

        assert_eq!(out.sample_rate, 16000);
        assert_eq!(out.channels, 1);
        assert_eq!(out.samples, vec![30]);
    }

    #[test]
    fn test_normalize_upsamples_by_interpolation() {
        let out = normalize_frame(frame(vec![0, 100, 200], 8000, 1), 16000, 1);
        assert_eq!(out.sample_rate, 16000);
        assert_eq!(out.samples, vec![0, 50, 100, 150, 200, 200]);
    }

    #[test]
    fn test_non_integer_ratio_keeps_duration() {
        // 100 ms at 44.1 kHz must stay 100 ms at 16 kHz
        let out = normalize_frame(frame(vec![0; 4410], 44100, 1), 16000, 1);
        assert_eq!(out.sample_rate, 16000);
        assert_eq!(out.samples.len(), 1600);

        let stereo = normalize_frame(frame(vec![0; 4410 * 2], 44100, 2), 16000, 1);
        assert_eq!(stereo.channels, 1);
        assert_eq!(stereo.samples.len(), 1600);
    }

    #[test]
    fn test_wav_buffer_probes() {
        let samples = vec![0i16; 16000];
        let buffer = AudioBuffer::from_pcm(&samples, 16000, 1).unwrap();

        assert_eq!(buffer.mime(), "audio/wav");
        assert!(buffer.len() > 44);

        let info = buffer.probe().unwrap();
        assert_eq!(info.sample_rate, Some(16000));
        assert_eq!(info.channels, Some(1));
        let duration = info.duration.expect("wav reports length");
        assert!((duration.as_secs_f64() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_garbage_is_unplayable() {
        let buffer = AudioBuffer::new(vec![0x13u8; 64], "application/octet-stream");
        let err = buffer.probe().unwrap_err();
        assert!(matches!(err, SessionError::SynthesisFailure(_)));
    }

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.buffer_duration_ms, 100);
    }
}
