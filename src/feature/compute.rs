use crate::dsp::spectrum;
use crate::error::ExtractionError;

use super::FeatureType;
use super::cache::{FeatureCache, FeatureVector};
use super::mel::{MelFilterBank, dct_ii};

/// Mel bands feeding the cepstral transform.
const MEL_BAND_COUNT: usize = 23;

/// Compute one feature from the shared mono signal, the sample rate, the
/// resolved parameters, and the prerequisite vectors already in the cache.
///
/// Missing prerequisites are a scheduling fault surfaced as
/// [`ExtractionError::DependencyOrder`]; the engine's resolution order makes
/// that unreachable.
pub(crate) fn compute(
    feature_type: FeatureType,
    mono: &[f64],
    sample_rate_hz: f64,
    params: &[(&'static str, f64)],
    cache: &FeatureCache,
) -> Result<FeatureVector, ExtractionError> {
    let prerequisite = |needed: FeatureType| {
        cache
            .get(needed)
            .ok_or(ExtractionError::DependencyOrder {
                feature: feature_type.name(),
                prerequisite: needed.name(),
            })
    };

    let values = match feature_type {
        FeatureType::PowerSpectrum => spectrum::power_spectrum(mono),
        FeatureType::MagnitudeSpectrum => spectrum::magnitude_spectrum(mono),
        FeatureType::RootMeanSquare => vec![root_mean_square(mono)],
        FeatureType::ZeroCrossings => vec![zero_crossings(mono) as f64],
        FeatureType::SpectralCentroid => {
            let power = prerequisite(FeatureType::PowerSpectrum)?;
            vec![spectral_centroid(power.values())]
        }
        FeatureType::SpectralRolloff => {
            let power = prerequisite(FeatureType::PowerSpectrum)?;
            vec![spectral_rolloff(power.values(), param(params, "cutoff"))]
        }
        FeatureType::Compactness => {
            let magnitude = prerequisite(FeatureType::MagnitudeSpectrum)?;
            vec![compactness(magnitude.values())]
        }
        FeatureType::Mfcc => {
            let magnitude = prerequisite(FeatureType::MagnitudeSpectrum)?;
            mfcc(
                magnitude.values(),
                sample_rate_hz,
                param(params, "coefficients").round() as usize,
            )
        }
        FeatureType::StrongestFrequency => {
            let centroid = prerequisite(FeatureType::SpectralCentroid)?;
            let power = prerequisite(FeatureType::PowerSpectrum)?;
            vec![strongest_frequency(
                centroid.values(),
                power.values().len(),
                sample_rate_hz,
            )]
        }
    };
    Ok(FeatureVector::from(values))
}

/// Resolved parameter lookup; the engine validates declared parameters
/// before computation runs.
fn param(params: &[(&'static str, f64)], name: &str) -> f64 {
    params
        .iter()
        .find(|(param_name, _)| *param_name == name)
        .map(|(_, value)| *value)
        .expect("declared parameter resolved by the engine")
}

fn root_mean_square(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&sample| sample * sample).sum();
    (sum / samples.len() as f64).sqrt()
}

fn zero_crossings(samples: &[f64]) -> u64 {
    if samples.len() < 2 {
        return 0;
    }
    let mut crossings = 0u64;
    let mut prev = samples[0];
    for &current in &samples[1..] {
        let crossed = (prev >= 0.0 && current < 0.0) || (prev < 0.0 && current >= 0.0);
        if crossed && (prev != 0.0 || current != 0.0) {
            crossings += 1;
        }
        prev = current;
    }
    crossings
}

/// Centre of mass of the power spectrum, in bin units.
fn spectral_centroid(power: &[f64]) -> f64 {
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = power
        .iter()
        .enumerate()
        .map(|(bin, &value)| bin as f64 * value)
        .sum();
    weighted / total
}

/// Fraction of bins below which `cutoff` of the total power lies.
fn spectral_rolloff(power: &[f64], cutoff: f64) -> f64 {
    if power.is_empty() {
        return 0.0;
    }
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let threshold = total * cutoff;
    let mut accumulated = 0.0f64;
    for (bin, &value) in power.iter().enumerate() {
        accumulated += value;
        if accumulated >= threshold {
            return bin as f64 / power.len() as f64;
        }
    }
    1.0
}

/// Summed deviation of each magnitude bin from the log of its local mean.
fn compactness(magnitude: &[f64]) -> f64 {
    let mut sum = 0.0f64;
    for window in magnitude.windows(3) {
        let (prev, current, next) = (window[0], window[1], window[2]);
        if prev > 0.0 && current > 0.0 && next > 0.0 {
            let neighbourhood = (prev + current + next) / 3.0;
            sum += (current.ln() - neighbourhood.ln()).abs();
        }
    }
    sum
}

fn mfcc(magnitude: &[f64], sample_rate_hz: f64, coefficients: usize) -> Vec<f64> {
    if magnitude.is_empty() {
        return Vec::new();
    }
    let fft_len = magnitude.len() * 2;
    let bank = MelFilterBank::new(sample_rate_hz, fft_len, MEL_BAND_COUNT);
    let log_energies = bank.log_energies(magnitude);
    dct_ii(&log_energies, coefficients)
}

/// Dominant frequency in Hz derived from the centroid bin position.
fn strongest_frequency(centroid: &[f64], bin_count: usize, sample_rate_hz: f64) -> f64 {
    let Some(&centroid_bin) = centroid.first() else {
        return 0.0;
    };
    if bin_count == 0 {
        return 0.0;
    }
    centroid_bin * sample_rate_hz / (bin_count as f64 * 2.0)
}
