use super::chunk::SampleChunk;
use super::format::AudioFormat;
use crate::error::AudioError;

/// Upper bound of the logical amplitude range used by [`SampleBuffer::get`]
/// and [`SampleBuffer::set`], independent of the underlying bit depth.
pub const LOGICAL_MAX: f64 = i32::MAX as f64;

/// A decoded, per-sample-indexable view over one chunk's raw PCM bytes.
///
/// `get`/`set` operate in the symmetric logical range `[-LOGICAL_MAX,
/// LOGICAL_MAX]` regardless of bit depth; a `set` followed by a `get` at the
/// same index returns the value within one quantization step of the
/// underlying encoding.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    bytes: Vec<u8>,
    format: AudioFormat,
    start_timecode_ms: Option<f64>,
}

impl SampleBuffer {
    /// Wrap a chunk's bytes without copying.
    pub fn from_chunk(chunk: SampleChunk) -> Self {
        let format = *chunk.format();
        let start_timecode_ms = chunk.start_timecode_ms();
        Self {
            bytes: chunk.into_bytes(),
            format,
            start_timecode_ms,
        }
    }

    /// Allocate a zeroed buffer holding `sample_count` samples. The count is
    /// not scaled by the channel count; callers pre-multiply when counting
    /// per-channel samples.
    pub fn empty(format: AudioFormat, sample_count: usize) -> Self {
        Self {
            bytes: vec![0u8; sample_count * format.bytes_per_sample()],
            format,
            start_timecode_ms: None,
        }
    }

    /// Number of samples in the buffer, across all channels.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.format.bytes_per_sample()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn start_timecode_ms(&self) -> Option<f64> {
        self.start_timecode_ms
    }

    /// Sample at `index` scaled to the logical range. Out-of-range indices
    /// read as zero so filter windows may overrun the buffer edge.
    pub fn get(&self, index: usize) -> f64 {
        if index >= self.len() {
            return 0.0;
        }
        self.raw_at(index) as f64 * (LOGICAL_MAX / self.full_scale())
    }

    /// Raw quantized integer value at `index`, sign-adjusted to be centered
    /// on zero. Out-of-range indices read as zero.
    pub fn get_unscaled(&self, index: usize) -> i32 {
        if index >= self.len() {
            return 0;
        }
        self.raw_at(index)
    }

    /// Store `value` at `index`, hard-clamping to the logical range before
    /// quantizing to the underlying bit depth. Out-of-range indices are
    /// ignored.
    pub fn set(&mut self, index: usize, value: f64) {
        if index >= self.len() {
            return;
        }
        let clamped = value.clamp(-LOGICAL_MAX, LOGICAL_MAX);
        let full_scale = self.full_scale();
        let raw = (clamped / LOGICAL_MAX * full_scale).round() as i64;
        let limit = full_scale as i64;
        self.put_raw(index, raw.clamp(-limit, limit) as i32);
    }

    /// All samples normalized to `[-1, 1]`.
    pub fn as_f64_array(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(i) / LOGICAL_MAX).collect()
    }

    /// Samples deinterleaved into one `[-1, 1]` array per channel.
    pub fn as_f64_channel_array(&self) -> Vec<Vec<f64>> {
        let channels = self.format.channels() as usize;
        let frames = self.len() / channels;
        let mut out = vec![Vec::with_capacity(frames); channels];
        for frame in 0..frames {
            for (channel, samples) in out.iter_mut().enumerate() {
                samples.push(self.get(frame * channels + channel) / LOGICAL_MAX);
            }
        }
        out
    }

    /// Repack the buffer into a chunk, carrying the start timecode along.
    pub fn to_chunk(&self) -> SampleChunk {
        let chunk = SampleChunk::new(self.bytes.clone(), self.format);
        match self.start_timecode_ms {
            Some(ms) => chunk.with_start_timecode_ms(ms),
            None => chunk,
        }
    }

    /// Extract a single channel into its own mono chunk by striding over the
    /// interleaved data.
    pub fn sample_chunk_for_channel(&self, channel: usize) -> Result<SampleChunk, AudioError> {
        let channels = self.format.channels() as usize;
        if channel >= channels {
            return Err(AudioError::InvalidArgument(format!(
                "Cannot extract channel {channel}: buffer only has {channels} channels"
            )));
        }
        if channel == 0 && channels == 1 {
            return Ok(self.to_chunk());
        }

        let bps = self.format.bytes_per_sample();
        let frames = self.len() / channels;
        let mut bytes = Vec::with_capacity(frames * bps);
        for frame in 0..frames {
            let start = (frame * channels + channel) * bps;
            bytes.extend_from_slice(&self.bytes[start..start + bps]);
        }
        let format = AudioFormat::new(self.format.bits(), self.format.sample_rate_khz(), 1)
            .with_signed(self.format.is_signed())
            .with_big_endian(self.format.is_big_endian());
        let chunk = SampleChunk::new(bytes, format);
        Ok(match self.start_timecode_ms {
            Some(ms) => chunk.with_start_timecode_ms(ms),
            None => chunk,
        })
    }

    /// Positive full-scale value of the underlying encoding.
    fn full_scale(&self) -> f64 {
        ((1i64 << (self.format.bits().min(32) - 1)) - 1) as f64
    }

    fn raw_at(&self, index: usize) -> i32 {
        let bps = self.format.bytes_per_sample();
        let bits = self.format.bits().min(32) as u32;
        let start = index * bps;
        let word = &self.bytes[start..start + bps];

        let mut acc: u32 = 0;
        if self.format.is_big_endian() {
            for &byte in word {
                acc = (acc << 8) | byte as u32;
            }
        } else {
            for (i, &byte) in word.iter().enumerate() {
                acc |= (byte as u32) << (8 * i);
            }
        }

        if self.format.is_signed() {
            if bits < 32 && acc & (1u32 << (bits - 1)) != 0 {
                acc |= !0u32 << bits;
            }
            acc as i32
        } else {
            (acc as i64 - (1i64 << (bits - 1))) as i32
        }
    }

    fn put_raw(&mut self, index: usize, raw: i32) {
        let bps = self.format.bytes_per_sample();
        let bits = self.format.bits().min(32) as u32;
        let start = index * bps;

        let acc = if self.format.is_signed() {
            raw as u32
        } else {
            (raw as i64 + (1i64 << (bits - 1))) as u32
        };

        let word = &mut self.bytes[start..start + bps];
        if self.format.is_big_endian() {
            for (i, byte) in word.iter_mut().enumerate() {
                *byte = (acc >> (8 * (bps - 1 - i))) as u8;
            }
        } else {
            for (i, byte) in word.iter_mut().enumerate() {
                *byte = (acc >> (8 * i)) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(bits: u16, channels: u16) -> AudioFormat {
        AudioFormat::new(bits, 8.0, channels)
    }

    #[test]
    fn sixteen_bit_scaling_matches_full_signed_scale() {
        let fmt = format(16, 1);
        let chunk = SampleChunk::new(1000i16.to_le_bytes().to_vec(), fmt);
        let buffer = SampleBuffer::from_chunk(chunk);
        let expected = 1000.0 * (i32::MAX as f64 / i16::MAX as f64);
        assert!((buffer.get(0) - expected).abs() < 1.0);
        assert_eq!(buffer.get_unscaled(0), 1000);
    }

    #[test]
    fn set_then_get_round_trips_within_one_quantization_step() {
        for bits in [8u16, 16, 24, 32] {
            for channels in [1u16, 2] {
                let mut buffer = SampleBuffer::empty(format(bits, channels), 8);
                let step = LOGICAL_MAX / ((1i64 << (bits - 1)) - 1) as f64;
                for (i, value) in [0.0f64, 1.2345e7, -9.8765e7, LOGICAL_MAX / 3.0]
                    .into_iter()
                    .enumerate()
                {
                    buffer.set(i, value);
                    let got = buffer.get(i);
                    assert!(
                        (got - value).abs() <= step,
                        "{bits}-bit/{channels}ch round trip off by {} (step {step})",
                        (got - value).abs()
                    );
                }
            }
        }
    }

    #[test]
    fn set_clamps_to_logical_range() {
        let mut buffer = SampleBuffer::empty(format(16, 1), 2);
        buffer.set(0, LOGICAL_MAX * 4.0);
        buffer.set(1, -LOGICAL_MAX * 4.0);
        assert_eq!(buffer.get_unscaled(0), i16::MAX as i32);
        assert_eq!(buffer.get_unscaled(1), -(i16::MAX as i32));
    }

    #[test]
    fn out_of_range_get_reads_zero() {
        let buffer = SampleBuffer::empty(format(16, 1), 4);
        assert_eq!(buffer.get(4), 0.0);
        assert_eq!(buffer.get(1000), 0.0);
        assert_eq!(buffer.get_unscaled(99), 0);
    }

    #[test]
    fn unsigned_eight_bit_is_centered_on_midpoint() {
        let fmt = format(8, 1).with_signed(false);
        let chunk = SampleChunk::new(vec![128u8, 255, 0], fmt);
        let buffer = SampleBuffer::from_chunk(chunk);
        assert_eq!(buffer.get_unscaled(0), 0);
        assert_eq!(buffer.get_unscaled(1), 127);
        assert_eq!(buffer.get_unscaled(2), -128);
    }

    #[test]
    fn big_endian_words_decode_like_little_endian_ones() {
        let value = -12345i16;
        let le = SampleBuffer::from_chunk(SampleChunk::new(
            value.to_le_bytes().to_vec(),
            format(16, 1),
        ));
        let be = SampleBuffer::from_chunk(SampleChunk::new(
            value.to_be_bytes().to_vec(),
            format(16, 1).with_big_endian(true),
        ));
        assert_eq!(le.get_unscaled(0), be.get_unscaled(0));
    }

    #[test]
    fn as_f64_array_normalizes_to_unit_range() {
        let fmt = format(16, 1);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&i16::MAX.to_le_bytes());
        bytes.extend_from_slice(&(-i16::MAX).to_le_bytes());
        let buffer = SampleBuffer::from_chunk(SampleChunk::new(bytes, fmt));
        let doubles = buffer.as_f64_array();
        assert!((doubles[0] - 1.0).abs() < 1e-6);
        assert!((doubles[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn channel_array_deinterleaves() {
        let fmt = format(16, 2);
        let mut buffer = SampleBuffer::empty(fmt, 4);
        buffer.set(0, LOGICAL_MAX);
        buffer.set(1, -LOGICAL_MAX);
        buffer.set(2, LOGICAL_MAX);
        buffer.set(3, -LOGICAL_MAX);
        let channels = buffer.as_f64_channel_array();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].len(), 2);
        assert!(channels[0].iter().all(|&v| v > 0.99));
        assert!(channels[1].iter().all(|&v| v < -0.99));
    }

    #[test]
    fn channel_extraction_strides_over_interleaved_data() {
        let fmt = format(16, 2);
        let mut bytes = Vec::new();
        for (left, right) in [(100i16, -100i16), (200, -200)] {
            bytes.extend_from_slice(&left.to_le_bytes());
            bytes.extend_from_slice(&right.to_le_bytes());
        }
        let buffer = SampleBuffer::from_chunk(SampleChunk::new(bytes, fmt));
        let right = SampleBuffer::from_chunk(buffer.sample_chunk_for_channel(1).unwrap());
        assert_eq!(right.format().channels(), 1);
        assert_eq!(right.get_unscaled(0), -100);
        assert_eq!(right.get_unscaled(1), -200);
    }

    #[test]
    fn channel_extraction_rejects_bad_index() {
        let buffer = SampleBuffer::empty(format(16, 2), 4);
        assert!(matches!(
            buffer.sample_chunk_for_channel(2),
            Err(AudioError::InvalidArgument(_))
        ));
    }
}
