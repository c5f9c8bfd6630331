use crate::audio::sample_buffer::SampleBuffer;
use crate::error::AudioError;

/// A finite-impulse-response filter stage with a fixed coefficient vector.
///
/// The window size equals the coefficient count N and successive windows
/// step by N−1 samples, overlapping the previous window by one sample so
/// continuity is preserved across chunk boundaries.
#[derive(Debug, Clone)]
pub struct FirFilter {
    coefficients: Vec<f64>,
}

impl FirFilter {
    /// A malformed coefficient set is a configuration error, rejected
    /// outright rather than tolerated at runtime.
    pub fn new(coefficients: Vec<f64>) -> Result<Self, AudioError> {
        if coefficients.is_empty() {
            return Err(AudioError::InvalidArgument(
                "FIR filter needs at least one coefficient".to_string(),
            ));
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AudioError::InvalidArgument(
                "FIR coefficients must be finite".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn window_size(&self) -> usize {
        self.coefficients.len()
    }

    /// Step between successive windows: one sample less than the window, so
    /// neighbouring windows share one sample.
    pub fn window_step(&self) -> usize {
        self.coefficients.len().saturating_sub(1).max(1)
    }

    /// Process one window in place. For every channel, the channel's first
    /// sample is replaced by the inner product of its first N samples with
    /// the coefficients; the rest of the window is left untouched. Channels
    /// are processed independently with the same coefficients. Windows that
    /// overrun the buffer edge read zeros.
    pub fn process_window(&self, buffer: &mut SampleBuffer) {
        let channels = buffer.format().channels() as usize;
        for channel in 0..channels {
            let mut acc = 0.0f64;
            for (i, &coefficient) in self.coefficients.iter().enumerate() {
                acc += buffer.get(i * channels + channel) * coefficient;
            }
            buffer.set(channel, acc);
        }
    }

    /// Filter a whole mono signal, carrying the trailing N−1 samples across
    /// window boundaries: `out[k] = Σ coefficients[i] · samples[k + i]`.
    /// Signals shorter than one window produce an empty output.
    pub fn filter_signal(&self, samples: &[f64]) -> Vec<f64> {
        let n = self.coefficients.len();
        if samples.len() < n {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(samples.len() - n + 1);
        for window in samples.windows(n) {
            let mut acc = 0.0f64;
            for (i, &coefficient) in self.coefficients.iter().enumerate() {
                acc += window[i] * coefficient;
            }
            out.push(acc);
        }
        out
    }
}
