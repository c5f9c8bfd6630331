use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Forward FFT bins of a real signal, zero-padded to the next power of two.
///
/// Returns the non-negative-frequency half of the transform together with
/// the padded transform length.
pub fn forward_bins(samples: &[f64]) -> (Vec<Complex<f64>>, usize) {
    let n = samples.len().next_power_of_two().max(2);
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&sample| Complex::new(sample, 0.0))
        .collect();
    buffer.resize(n, Complex::new(0.0, 0.0));
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);
    buffer.truncate(n / 2);
    (buffer, n)
}

/// Per-bin signal power `|X_k|² / n` over the non-negative frequencies.
pub fn power_spectrum(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let (bins, n) = forward_bins(samples);
    bins.iter().map(|bin| bin.norm_sqr() / n as f64).collect()
}

/// Per-bin magnitude `|X_k| / n` over the non-negative frequencies.
pub fn magnitude_spectrum(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let (bins, n) = forward_bins(samples);
    bins.iter().map(|bin| bin.norm() / n as f64).collect()
}
