//! Feature catalog, dependency resolution, and the extraction engine.

pub mod cache;
mod compute;
pub mod engine;
pub mod graph;
mod mel;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use cache::{FeatureCache, FeatureVector};
pub use engine::{ExtractionEngine, ExtractionReport};

/// Closed catalog of extractable acoustic feature kinds.
///
/// Declaration order doubles as the deterministic tie-break order for
/// scheduling and as the iteration order of the feature cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FeatureType {
    PowerSpectrum,
    MagnitudeSpectrum,
    RootMeanSquare,
    ZeroCrossings,
    SpectralCentroid,
    SpectralRolloff,
    Compactness,
    Mfcc,
    StrongestFrequency,
}

/// A named numeric parameter with its default value and legal bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl FeatureType {
    /// Every catalog entry in declaration order.
    pub const ALL: [FeatureType; 9] = [
        FeatureType::PowerSpectrum,
        FeatureType::MagnitudeSpectrum,
        FeatureType::RootMeanSquare,
        FeatureType::ZeroCrossings,
        FeatureType::SpectralCentroid,
        FeatureType::SpectralRolloff,
        FeatureType::Compactness,
        FeatureType::Mfcc,
        FeatureType::StrongestFrequency,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Stable display name.
    pub fn name(self) -> &'static str {
        match self {
            FeatureType::PowerSpectrum => "Power Spectrum",
            FeatureType::MagnitudeSpectrum => "Magnitude Spectrum",
            FeatureType::RootMeanSquare => "Root Mean Square",
            FeatureType::ZeroCrossings => "Zero Crossings",
            FeatureType::SpectralCentroid => "Spectral Centroid",
            FeatureType::SpectralRolloff => "Spectral Rolloff Point",
            FeatureType::Compactness => "Compactness",
            FeatureType::Mfcc => "MFCC",
            FeatureType::StrongestFrequency => "Strongest Frequency",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FeatureType::PowerSpectrum => "Signal power per frequency bin",
            FeatureType::MagnitudeSpectrum => "Spectral magnitude per frequency bin",
            FeatureType::RootMeanSquare => "Overall signal energy",
            FeatureType::ZeroCrossings => "Number of sign changes in the signal",
            FeatureType::SpectralCentroid => "Centre of mass of the power spectrum",
            FeatureType::SpectralRolloff => {
                "Fraction of bins below which the configured share of the power lies"
            }
            FeatureType::Compactness => "Deviation of the magnitude spectrum from its local mean",
            FeatureType::Mfcc => "Mel-frequency cepstral coefficients",
            FeatureType::StrongestFrequency => {
                "Dominant frequency in Hz, derived from the spectral centroid"
            }
        }
    }

    /// Direct prerequisites; the transitive closure is resolved by the
    /// scheduling graph. The relation is acyclic.
    pub fn prerequisites(self) -> &'static [FeatureType] {
        match self {
            FeatureType::SpectralCentroid => &[FeatureType::PowerSpectrum],
            FeatureType::SpectralRolloff => &[FeatureType::PowerSpectrum],
            FeatureType::Compactness => &[FeatureType::MagnitudeSpectrum],
            FeatureType::Mfcc => &[FeatureType::MagnitudeSpectrum],
            FeatureType::StrongestFrequency => {
                &[FeatureType::SpectralCentroid, FeatureType::PowerSpectrum]
            }
            _ => &[],
        }
    }

    /// Declared numeric parameters, in configuration order.
    pub fn parameters(self) -> &'static [Parameter] {
        match self {
            FeatureType::SpectralRolloff => &[Parameter {
                name: "cutoff",
                default: 0.85,
                min: 0.0,
                max: 1.0,
            }],
            FeatureType::Mfcc => &[Parameter {
                name: "coefficients",
                default: 13.0,
                min: 1.0,
                max: 40.0,
            }],
            _ => &[],
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Per-feature parameter overrides supplied by the host configuration
/// layer. Values are validated against the declared bounds when the
/// extraction engine resolves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    #[serde(default)]
    overrides: BTreeMap<FeatureType, BTreeMap<String, f64>>,
}

impl FeatureSettings {
    pub fn set(&mut self, feature: FeatureType, name: impl Into<String>, value: f64) {
        self.overrides
            .entry(feature)
            .or_default()
            .insert(name.into(), value);
    }

    /// Effective value for a declared parameter: the override when present,
    /// the declared default otherwise.
    pub fn value(&self, feature: FeatureType, parameter: &Parameter) -> f64 {
        self.overrides
            .get(&feature)
            .and_then(|overrides| overrides.get(parameter.name))
            .copied()
            .unwrap_or(parameter.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_indices_follow_declaration_order() {
        for (position, feature_type) in FeatureType::ALL.into_iter().enumerate() {
            assert_eq!(feature_type.index(), position);
        }
    }

    #[test]
    fn prerequisite_relation_is_acyclic() {
        // Walk every chain; the catalog is small enough to bound the walk by
        // its own size.
        for start in FeatureType::ALL {
            let mut frontier = vec![start];
            let mut steps = 0usize;
            while let Some(ty) = frontier.pop() {
                steps += 1;
                assert!(
                    steps <= FeatureType::COUNT * FeatureType::COUNT,
                    "prerequisite walk from {:?} did not terminate",
                    start
                );
                for &prerequisite in ty.prerequisites() {
                    assert_ne!(prerequisite, start, "cycle through {:?}", start);
                    frontier.push(prerequisite);
                }
            }
        }
    }

    #[test]
    fn settings_fall_back_to_declared_defaults() {
        let settings = FeatureSettings::default();
        let parameter = &FeatureType::SpectralRolloff.parameters()[0];
        assert_eq!(
            settings.value(FeatureType::SpectralRolloff, parameter),
            0.85
        );
    }

    #[test]
    fn settings_overrides_shadow_defaults() {
        let mut settings = FeatureSettings::default();
        settings.set(FeatureType::SpectralRolloff, "cutoff", 0.6);
        let parameter = &FeatureType::SpectralRolloff.parameters()[0];
        assert_eq!(settings.value(FeatureType::SpectralRolloff, parameter), 0.6);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let mut settings = FeatureSettings::default();
        settings.set(FeatureType::Mfcc, "coefficients", 20.0);
        let json = serde_json::to_string(&settings).unwrap();
        let restored: FeatureSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, restored);
    }
}
