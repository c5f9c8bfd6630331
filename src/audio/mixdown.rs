use super::sample_buffer::SampleBuffer;
use super::source::AudioSource;
use crate::error::SourceError;

/// Decode every chunk of a source into interleaved `[-1, 1]` samples.
///
/// The source is reset before and after reading, so the stream handle is
/// released on every exit path.
pub fn samples_interleaved(source: &mut AudioSource) -> Result<Vec<f64>, SourceError> {
    source.reset();
    let result = collect_interleaved(source);
    source.reset();
    result
}

/// Decode a source and mix all channels down to one mono signal by
/// arithmetic mean, at the source sample rate.
pub fn samples_mixed_down(source: &mut AudioSource) -> Result<Vec<f64>, SourceError> {
    source.reset();
    let result = collect_mono(source);
    source.reset();
    result
}

fn collect_interleaved(source: &mut AudioSource) -> Result<Vec<f64>, SourceError> {
    let mut samples = Vec::new();
    while let Some(chunk) = source.next_chunk()? {
        let buffer = SampleBuffer::from_chunk(chunk);
        samples.extend(buffer.as_f64_array());
    }
    Ok(samples)
}

fn collect_mono(source: &mut AudioSource) -> Result<Vec<f64>, SourceError> {
    let channels = source.format()?.channels() as usize;
    let mut mono = Vec::new();
    while let Some(chunk) = source.next_chunk()? {
        let buffer = SampleBuffer::from_chunk(chunk);
        mix_interleaved_into(&mut mono, &buffer.as_f64_array(), channels);
    }
    Ok(mono)
}

/// Average interleaved samples across channels, appending one mono sample
/// per frame. Trailing bytes short of a full frame are dropped.
pub fn mix_interleaved_into(out: &mut Vec<f64>, samples: &[f64], channels: usize) {
    let channels = channels.max(1);
    if channels == 1 {
        out.extend_from_slice(samples);
        return;
    }
    let frames = samples.len() / channels;
    out.reserve(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let sum: f64 = samples[start..start + channels].iter().sum();
        out.push(sum / channels as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn mix_averages_across_channels() {
        let mut mono = Vec::new();
        mix_interleaved_into(&mut mono, &[0.5, 0.1, -0.6, 0.2], 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-9);
        assert!((mono[1] + 0.2).abs() < 1e-9);
    }

    #[test]
    fn mono_input_passes_through() {
        let mut mono = Vec::new();
        mix_interleaved_into(&mut mono, &[0.25, -0.75], 1);
        assert_eq!(mono, vec![0.25, -0.75]);
    }

    #[test]
    fn opposite_channels_cancel_to_silence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cancel.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for value in [1000i16, 2000, 3000, 4000] {
            writer.write_sample(value).unwrap();
            writer.write_sample(-value).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = AudioSource::new(&path);
        let mono = samples_mixed_down(&mut source).unwrap();
        assert_eq!(mono.len(), 4);
        assert!(mono.iter().all(|&v| v.abs() < 1e-9));
        assert!(!source.is_open());
    }
}
