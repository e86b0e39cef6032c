use std::path::Path;

use anyhow::{bail, Context, Result};

/// Reads the first channel of a WAV file. Returns the sample rate and the samples in `-1.0..=1.0`.
pub fn read_wav(path: &Path) -> Result<(u32, Vec<f32>)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample > 32 {
                bail!("Unsupported bit depth {}", spec.bits_per_sample);
            }
            let scale = 1.0 / ((1i64 << (spec.bits_per_sample - 1)) as f32);
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|sample| (sample as f32) * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = interleaved.iter().step_by(channel_count.max(1)).cloned().collect();
    log::info!(
        "Read {} ({} Hz, {} channel(s), {} bit)",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );
    Ok((spec.sample_rate, samples))
}

/// Writes a mono 16 bit WAV file, clamping samples to `-1.0..=1.0`.
pub fn write_wav(path: &Path, sample_rate: u32, buffer: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let amplitude = i16::MAX as f32;
    for sample in buffer.iter() {
        let clamped_sample = sample.max(-1.0).min(1.0);
        writer.write_sample((clamped_sample * amplitude) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
