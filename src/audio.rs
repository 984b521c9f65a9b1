//! Audio file I/O and sample-rate conversion.
//!
//! Diphone banks may be recorded as WAV (read with [`hound`]) or FLAC (read
//! with [`claxon`]).  Every clip is downmixed to mono and resampled to the
//! project rate before analysis, so a bank recorded at 44.1 kHz works as is.
//!
//! Output is always 16-bit PCM mono WAV.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{Error, Result};

/// Decoded audio, one `Vec` per channel.
struct Decoded {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

fn read_wav(path: &Path) -> Result<Decoded> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let n_channels = spec.channels.max(1) as usize;
    let mut channels = vec![Vec::new(); n_channels];

    match spec.sample_format {
        SampleFormat::Float => {
            for (idx, sample) in reader.samples::<f32>().enumerate() {
                channels[idx % n_channels].push(sample?);
            }
        }
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            for (idx, sample) in reader.samples::<i32>().enumerate() {
                channels[idx % n_channels].push(sample? as f32 / max);
            }
        }
    }

    Ok(Decoded { channels, sample_rate: spec.sample_rate })
}

fn read_flac(path: &Path) -> Result<Decoded> {
    let mut reader = claxon::FlacReader::open(path)
        .map_err(|e| Error::Audio(format!("{}: {}", path.display(), e)))?;
    let info = reader.streaminfo();
    let n_channels = info.channels.max(1) as usize;
    let max = (1_i64 << (info.bits_per_sample - 1)) as f32;
    let mut channels = vec![Vec::new(); n_channels];

    for (idx, sample) in reader.samples().enumerate() {
        let s = sample.map_err(|e| Error::Audio(format!("{}: {}", path.display(), e)))?;
        channels[idx % n_channels].push(s as f32 / max);
    }

    Ok(Decoded { channels, sample_rate: info.sample_rate })
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel and rate conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Average all channels into one.
pub fn downmix(channels: Vec<Vec<f32>>) -> Result<Vec<f32>> {
    let mut iter = channels.into_iter();
    let Some(mut mixed) = iter.next() else {
        return Ok(Vec::new());
    };
    let mut count = 1usize;
    for channel in iter {
        if channel.len() != mixed.len() {
            return Err(Error::Audio("channel length mismatch in downmix".into()));
        }
        for (m, s) in mixed.iter_mut().zip(&channel) {
            *m += *s;
        }
        count += 1;
    }
    if count > 1 {
        let scale = 1.0 / count as f32;
        mixed.iter_mut().for_each(|m| *m *= scale);
    }
    Ok(mixed)
}

/// Resample a mono signal from `from_rate` to `to_rate`.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| Error::Audio(format!("resampler setup failed: {e}")))?;
    let input = vec![samples];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| Error::Audio(format!("resampling failed: {e}")))?
        .pop()
        .unwrap_or_default();

    // A single chunk leaves the last half filter length in the resampler.
    if output.len() < expected {
        let tail = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| Error::Audio(format!("resampler flush failed: {e}")))?
            .pop()
            .unwrap_or_default();
        output.extend(tail);
    }
    output.truncate(expected);
    Ok(output)
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Load `path` as a mono waveform at `sample_rate` Hz.
///
/// The format is chosen from the file extension (`wav` or `flac`).
pub fn load_mono(path: &Path, sample_rate: u32) -> Result<Vec<f32>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let decoded = match ext.as_deref() {
        Some("wav") | Some("wave") => read_wav(path)?,
        Some("flac") => read_flac(path)?,
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };
    log::debug!(
        "Loaded {} ({} ch, {} Hz, {} frames)",
        path.display(),
        decoded.channels.len(),
        decoded.sample_rate,
        decoded.channels.first().map_or(0, Vec::len)
    );
    let mono = downmix(decoded.channels)?;
    resample(mono, decoded.sample_rate, sample_rate)
}

/// Write mono `samples` as a 16-bit PCM WAV file at `sample_rate` Hz.
///
/// Samples are clamped to `[-1.0, 1.0]` before conversion.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        let s16 = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(s16)?;
    }
    writer.finalize()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
