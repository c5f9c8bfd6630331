use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek};
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer as DecodedSampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::BUFFER_SAMPLE_COUNT;
use super::chunk::SampleChunk;
use super::format::AudioFormat;
use crate::error::SourceError;

/// A file-backed PCM byte stream with lazy open, reset, and explicit close.
///
/// The decode-stream handle stays `None` until the first read. Integer PCM
/// WAV files stream their data chunk straight from disk; other containers
/// (32-bit float WAV, AIFF, anything else symphonia resolves) are decoded up
/// front and re-quantized to 16-bit little-endian PCM held in memory.
///
/// Access is sequential: one open handle at a time, no concurrent reads on
/// one instance. Dropping the source releases any open handle.
#[derive(Debug)]
pub struct AudioSource {
    path: PathBuf,
    format: Option<AudioFormat>,
    stream: Option<DecodeStream>,
    frames_delivered: u64,
}

#[derive(Debug)]
enum DecodeStream {
    /// Raw bytes streamed out of a WAV data chunk.
    File {
        reader: BufReader<File>,
        remaining: u64,
    },
    /// Pre-decoded PCM bytes for containers without a raw PCM data chunk.
    Memory { bytes: Vec<u8>, pos: usize },
}

/// Input classification produced by the format probe.
enum InputKind {
    PcmWav(hound::WavSpec),
    Transcode { sample_rate: u32, channels: u16 },
}

impl AudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            stream: None,
            frames_delivered: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected format of the stream this source yields. Probed on first
    /// call and cached; probing does not open the decode stream.
    pub fn format(&mut self) -> Result<AudioFormat, SourceError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let format = format_for(&classify(&self.path)?);
        self.format = Some(format);
        Ok(format)
    }

    /// Lazily create the decode-stream handle. Idempotent: an already-open
    /// source is left untouched.
    pub fn open(&mut self) -> Result<(), SourceError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let kind = classify(&self.path)?;
        let format = format_for(&kind);
        self.format = Some(format);
        self.stream = Some(match kind {
            InputKind::PcmWav(_) => {
                let (reader, remaining) = open_data_chunk(&self.path)?;
                DecodeStream::File { reader, remaining }
            }
            InputKind::Transcode { .. } => {
                let bytes = transcode_to_pcm16(&self.path)?;
                DecodeStream::Memory { bytes, pos: 0 }
            }
        });
        tracing::debug!(path = %self.path.display(), ?format, "opened audio source");
        Ok(())
    }

    /// Read the next fixed-size window of encoded bytes, sized as
    /// `BUFFER_SAMPLE_COUNT × channels × bytes_per_sample`. Returns `None`
    /// at end-of-stream and a shorter final chunk when fewer bytes remain
    /// than a full window; the window is never padded.
    ///
    /// A mid-stream read failure closes the source before the error is
    /// returned.
    pub fn next_chunk(&mut self) -> Result<Option<SampleChunk>, SourceError> {
        self.open()?;
        let format = self.format.expect("format probed by open");
        let window = BUFFER_SAMPLE_COUNT * format.channels() as usize * format.bytes_per_sample();

        let read = match self.stream.as_mut().expect("stream opened above") {
            DecodeStream::File { reader, remaining } => {
                read_window(reader, remaining, window)
            }
            DecodeStream::Memory { bytes, pos } => {
                let end = (*pos + window).min(bytes.len());
                let slice = bytes[*pos..end].to_vec();
                *pos = end;
                Ok(slice)
            }
        };
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(err) => {
                self.close();
                return Err(SourceError::Io {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        if bytes.is_empty() {
            return Ok(None);
        }

        let start_ms =
            self.frames_delivered as f64 / format.sample_rate_hz().max(1) as f64 * 1000.0;
        self.frames_delivered += (bytes.len() / format.bytes_per_frame()) as u64;
        Ok(Some(
            SampleChunk::new(bytes, format).with_start_timecode_ms(start_ms),
        ))
    }

    /// Close any open handle and discard the stream position. The next read
    /// re-opens from the start of the stream.
    pub fn reset(&mut self) {
        self.stream = None;
        self.frames_delivered = 0;
    }

    /// Release the decode-stream handle. No-op when already closed.
    pub fn close(&mut self) {
        self.reset();
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

/// Fill up to one window of bytes, tolerating short reads.
fn read_window(
    reader: &mut BufReader<File>,
    remaining: &mut u64,
    window: usize,
) -> Result<Vec<u8>, std::io::Error> {
    let want = (*remaining).min(window as u64) as usize;
    let mut bytes = vec![0u8; want];
    let mut filled = 0usize;
    while filled < want {
        match reader.read(&mut bytes[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    bytes.truncate(filled);
    *remaining -= filled as u64;
    Ok(bytes)
}

fn classify(path: &Path) -> Result<InputKind, SourceError> {
    let file = File::open(path).map_err(|err| SourceError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    match hound::WavReader::new(BufReader::new(file)) {
        Ok(reader) => {
            let spec = reader.spec();
            if spec.sample_format == hound::SampleFormat::Int {
                Ok(InputKind::PcmWav(spec))
            } else {
                Ok(InputKind::Transcode {
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                })
            }
        }
        Err(hound::Error::IoError(err)) => Err(SourceError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
        Err(_) => probe_container(path),
    }
}

fn format_for(kind: &InputKind) -> AudioFormat {
    match kind {
        InputKind::PcmWav(spec) => AudioFormat::new(
            spec.bits_per_sample,
            spec.sample_rate as f64 / 1000.0,
            spec.channels,
        )
        // WAV stores 8-bit PCM unsigned and wider depths signed.
        .with_signed(spec.bits_per_sample > 8),
        InputKind::Transcode {
            sample_rate,
            channels,
        } => AudioFormat::new(16, *sample_rate as f64 / 1000.0, *channels),
    }
}

/// Probe a non-WAV container for its stream parameters without decoding.
fn probe_container(path: &Path) -> Result<InputKind, SourceError> {
    let file = File::open(path).map_err(|err| SourceError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    let track =
        probed
            .format
            .default_track()
            .ok_or_else(|| SourceError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "no default track".to_string(),
            })?;
    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "missing sample rate".to_string(),
        })?;
    let channels = params
        .channels
        .ok_or_else(|| SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "missing channel count".to_string(),
        })?
        .count() as u16;
    Ok(InputKind::Transcode {
        sample_rate,
        channels: channels.max(1),
    })
}

/// Walk the RIFF chunk list and leave a reader positioned at the start of
/// the `data` chunk.
fn open_data_chunk(path: &Path) -> Result<(BufReader<File>, u64), SourceError> {
    let mut file = File::open(path).map_err(|err| SourceError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;

    let mut riff = [0u8; 12];
    file.read_exact(&mut riff).map_err(|err| SourceError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "not a RIFF/WAVE file".to_string(),
        });
    }

    loop {
        let mut header = [0u8; 8];
        if let Err(err) = file.read_exact(&mut header) {
            return Err(if err.kind() == ErrorKind::UnexpectedEof {
                SourceError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    reason: "no data chunk".to_string(),
                }
            } else {
                SourceError::Io {
                    path: path.to_path_buf(),
                    source: err,
                }
            });
        }
        let size = u32::from_le_bytes(header[4..8].try_into().expect("4-byte slice")) as u64;
        if &header[0..4] == b"data" {
            return Ok((BufReader::new(file), size));
        }
        // Chunks are word-aligned; odd sizes carry one padding byte.
        let skip = size + (size % 2);
        file.seek(std::io::SeekFrom::Current(skip as i64))
            .map_err(|err| SourceError::Io {
                path: path.to_path_buf(),
                source: err,
            })?;
    }
}

/// Decode a container through symphonia and re-quantize the interleaved
/// samples to 16-bit little-endian signed PCM.
fn transcode_to_pcm16(path: &Path) -> Result<Vec<u8>, SourceError> {
    let unsupported = |reason: String| SourceError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|err| SourceError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| unsupported(err.to_string()))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| unsupported("no default track".to_string()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| unsupported(err.to_string()))?;

    let mut bytes = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(err) => return Err(unsupported(err.to_string())),
        };
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(unsupported(err.to_string())),
        };
        let spec = *decoded.spec();
        let mut interleaved = DecodedSampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);
        for &sample in interleaved.samples() {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            bytes.extend_from_slice(&quantized.to_le_bytes());
        }
    }

    if bytes.is_empty() {
        return Err(unsupported("decoded 0 samples".to_string()));
    }
    tracing::debug!(
        path = %path.display(),
        bytes = bytes.len(),
        "transcoded container to 16-bit PCM"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, frames: usize) {
        let spec = WavSpec {
            channels,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for channel in 0..channels {
                let value = (i as i16).wrapping_mul(if channel % 2 == 0 { 1 } else { -1 });
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn handle_stays_closed_until_first_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lazy.wav");
        write_wav(&path, 1, 100);

        let mut source = AudioSource::new(&path);
        assert!(!source.is_open());
        source.format().unwrap();
        assert!(!source.is_open());
        source.next_chunk().unwrap().unwrap();
        assert!(source.is_open());
    }

    #[test]
    fn reads_full_windows_then_a_short_final_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("windows.wav");
        write_wav(&path, 2, BUFFER_SAMPLE_COUNT + 100);

        let mut source = AudioSource::new(&path);
        let first = source.next_chunk().unwrap().unwrap();
        assert_eq!(first.byte_len(), BUFFER_SAMPLE_COUNT * 2 * 2);
        assert_eq!(first.start_timecode_ms(), Some(0.0));
        let second = source.next_chunk().unwrap().unwrap();
        assert_eq!(second.byte_len(), 100 * 2 * 2);
        let expected_ms = BUFFER_SAMPLE_COUNT as f64 / 8_000.0 * 1000.0;
        assert!((second.start_timecode_ms().unwrap() - expected_ms).abs() < 1e-9);
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn reset_rewinds_to_the_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reset.wav");
        write_wav(&path, 1, 10);

        let mut source = AudioSource::new(&path);
        let first = source.next_chunk().unwrap().unwrap();
        source.reset();
        assert!(!source.is_open());
        let again = source.next_chunk().unwrap().unwrap();
        assert_eq!(first.bytes(), again.bytes());
        assert_eq!(again.start_timecode_ms(), Some(0.0));
    }

    #[test]
    fn close_is_a_no_op_when_already_closed() {
        let mut source = AudioSource::new("/nonexistent.wav");
        source.close();
        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let mut source = AudioSource::new(dir.path().join("gone.wav"));
        assert!(matches!(source.open(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn unrecognized_container_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.wav");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"this is not audio at all, not even close")
            .unwrap();
        drop(file);

        let mut source = AudioSource::new(&path);
        assert!(matches!(
            source.open(),
            Err(SourceError::UnsupportedFormat { .. })
        ));
        assert!(!source.is_open());
    }

    #[test]
    fn wav_format_probe_reports_pcm_parameters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.wav");
        write_wav(&path, 2, 16);

        let mut source = AudioSource::new(&path);
        let format = source.format().unwrap();
        assert_eq!(format.bits(), 16);
        assert_eq!(format.channels(), 2);
        assert_eq!(format.sample_rate_hz(), 8_000);
        assert!(format.is_signed());
        assert!(!format.is_big_endian());
    }

    #[test]
    fn float_wav_is_transcoded_to_sixteen_bit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..64 {
            writer.write_sample::<f32>(0.5).unwrap();
        }
        writer.finalize().unwrap();

        let mut source = AudioSource::new(&path);
        let format = source.format().unwrap();
        assert_eq!(format.bits(), 16);
        let chunk = source.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.byte_len(), 64 * 2);
        let value = i16::from_le_bytes(chunk.bytes()[0..2].try_into().unwrap());
        assert!((value as f32 / i16::MAX as f32 - 0.5).abs() < 1e-3);
    }
}
