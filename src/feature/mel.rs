//! Mel filterbank and cosine transform backing the cepstral feature.

use std::f64::consts::PI;

/// Triangular mel-spaced filterbank over the non-negative FFT bins.
pub(crate) struct MelFilterBank {
    filters: Vec<Vec<(usize, f64)>>,
}

impl MelFilterBank {
    /// Build `band_count` triangular filters spanning 0 Hz to Nyquist.
    /// `fft_len` is the full transform length behind the spectrum the
    /// filters will be applied to.
    pub(crate) fn new(sample_rate_hz: f64, fft_len: usize, band_count: usize) -> Self {
        let edges = band_edge_bins(sample_rate_hz, fft_len, band_count);
        let mut filters = Vec::with_capacity(band_count);
        for band in 0..band_count {
            let left = edges[band];
            let center = edges[band + 1];
            let right = edges[band + 2].max(center + 1);
            filters.push(triangle_weights(left, center, right));
        }
        Self { filters }
    }

    /// Natural-log energy per band after applying the filters to a spectrum.
    pub(crate) fn log_energies(&self, spectrum: &[f64]) -> Vec<f64> {
        self.filters
            .iter()
            .map(|filter| {
                let mut sum = 0.0f64;
                for &(bin, weight) in filter {
                    sum += spectrum.get(bin).copied().unwrap_or(0.0).max(0.0) * weight;
                }
                sum.max(1e-12).ln()
            })
            .collect()
    }
}

/// Bin indices of the `band_count + 2` mel-spaced band edges.
fn band_edge_bins(sample_rate_hz: f64, fft_len: usize, band_count: usize) -> Vec<usize> {
    let nyquist = (sample_rate_hz * 0.5).max(1.0);
    let mel_max = hz_to_mel(nyquist);
    (0..band_count + 2)
        .map(|i| {
            let t = i as f64 / (band_count + 1) as f64;
            bin_for_frequency(mel_to_hz(mel_max * t), sample_rate_hz, fft_len)
        })
        .collect()
}

fn triangle_weights(left: usize, center: usize, right: usize) -> Vec<(usize, f64)> {
    let mut weights = Vec::new();
    if right <= left {
        return weights;
    }
    for bin in left..=right {
        let weight = if bin < center {
            if center == left {
                0.0
            } else {
                (bin - left) as f64 / (center - left) as f64
            }
        } else if right == center {
            0.0
        } else {
            (right - bin) as f64 / (right - center) as f64
        };
        if weight > 0.0 {
            weights.push((bin, weight));
        }
    }
    weights
}

fn bin_for_frequency(frequency_hz: f64, sample_rate_hz: f64, fft_len: usize) -> usize {
    let nyquist = (sample_rate_hz * 0.5).max(1.0);
    let clamped = frequency_hz.clamp(0.0, nyquist);
    ((clamped * fft_len as f64 / sample_rate_hz.max(1.0)).floor() as usize).min(fft_len / 2)
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// Type-II discrete cosine transform, truncated to `count` coefficients.
pub(crate) fn dct_ii(values: &[f64], count: usize) -> Vec<f64> {
    let n = values.len().max(1) as f64;
    (0..count)
        .map(|k| {
            let mut sum = 0.0f64;
            for (i, &value) in values.iter().enumerate() {
                sum += value * (PI * k as f64 * (i as f64 + 0.5) / n).cos();
            }
            sum
        })
        .collect()
}
