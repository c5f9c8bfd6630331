use crate::audio::{Audio, mixdown};
use crate::error::ExtractionError;

use super::{FeatureSettings, FeatureType, compute, graph};

/// Outcome of one extraction request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Types computed and stored by this call, in schedule order.
    pub computed: Vec<FeatureType>,
    /// Types skipped because the cache already held them.
    pub cached: Vec<FeatureType>,
    /// Types whose computation failed, with the rendered failure. Their
    /// cache entries stay absent so a corrected retry can succeed.
    pub failed: Vec<(FeatureType, String)>,
}

/// Dependency-ordered feature computation over one audio instance.
///
/// The engine is synchronous: decoding, mixdown, and every computation for
/// one audio run to completion on the calling thread. Separate audio
/// instances may be processed concurrently on separate threads since no
/// state is shared between them.
#[derive(Debug, Clone, Default)]
pub struct ExtractionEngine {
    settings: FeatureSettings,
}

impl ExtractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: FeatureSettings) -> Self {
        Self { settings }
    }

    pub fn settings_mut(&mut self) -> &mut FeatureSettings {
        &mut self.settings
    }

    /// Compute every requested type plus its prerequisites in dependency
    /// order, storing results in the audio's feature cache.
    ///
    /// The source is decoded and mixed down to mono once, up front; a
    /// decode failure aborts before any cache entry is touched. After that
    /// point a single type's failure is logged, its entry stays absent, and
    /// the remaining types still run. An empty mono signal stores nothing:
    /// every requested entry is left absent rather than zero-length.
    pub fn extract(
        &self,
        audio: &mut Audio,
        requested: &[FeatureType],
    ) -> Result<ExtractionReport, ExtractionError> {
        let mut report = ExtractionReport::default();
        if requested.is_empty() {
            tracing::debug!(audio = audio.name(), "no feature requested");
            return Ok(report);
        }

        let order = graph::resolution_order(requested);
        let mono = mixdown::samples_mixed_down(audio.source_mut())?;
        let sample_rate_hz = audio.format()?.sample_rate_hz() as f64;

        if mono.is_empty() {
            tracing::debug!(
                audio = audio.name(),
                "empty mono signal; leaving requested entries absent"
            );
            return Ok(report);
        }
        tracing::debug!(
            audio = audio.name(),
            samples = mono.len(),
            features = order.len(),
            "extracting features"
        );

        for feature_type in order {
            if audio.feature_vector(feature_type).is_some() {
                report.cached.push(feature_type);
                continue;
            }

            // Prerequisites must already sit in the cache. An absence that
            // traces back to a recorded failure cascades; anything else is
            // a scheduling fault.
            if let Some(missing) = feature_type
                .prerequisites()
                .iter()
                .copied()
                .find(|prerequisite| audio.feature_vector(*prerequisite).is_none())
            {
                if report.failed.iter().any(|(failed, _)| *failed == missing) {
                    let message = format!("prerequisite {} unavailable", missing.name());
                    tracing::warn!(feature = feature_type.name(), %message, "skipping feature");
                    report.failed.push((feature_type, message));
                    continue;
                }
                debug_assert!(
                    false,
                    "{} scheduled before {}",
                    feature_type.name(),
                    missing.name()
                );
                return Err(ExtractionError::DependencyOrder {
                    feature: feature_type.name(),
                    prerequisite: missing.name(),
                });
            }

            let params = match self.resolve_parameters(feature_type) {
                Ok(params) => params,
                Err(err) => {
                    tracing::warn!(
                        feature = feature_type.name(),
                        error = %err,
                        "invalid parameter; entry left absent"
                    );
                    report.failed.push((feature_type, err.to_string()));
                    continue;
                }
            };

            match compute::compute(
                feature_type,
                &mono,
                sample_rate_hz,
                &params,
                audio.features(),
            ) {
                Ok(vector) => {
                    audio.set_feature_vector(feature_type, vector);
                    report.computed.push(feature_type);
                }
                Err(err) => {
                    tracing::warn!(
                        feature = feature_type.name(),
                        error = %err,
                        "feature computation failed"
                    );
                    report.failed.push((feature_type, err.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Validate every declared parameter of `feature_type` against its
    /// bounds, yielding resolved name/value pairs.
    fn resolve_parameters(
        &self,
        feature_type: FeatureType,
    ) -> Result<Vec<(&'static str, f64)>, ExtractionError> {
        let declared = feature_type.parameters();
        let mut resolved = Vec::with_capacity(declared.len());
        for parameter in declared {
            let value = self.settings.value(feature_type, parameter);
            if !value.is_finite() || value < parameter.min || value > parameter.max {
                return Err(ExtractionError::InvalidParameter {
                    feature: feature_type.name(),
                    name: parameter.name,
                    value,
                    min: parameter.min,
                    max: parameter.max,
                });
            }
            resolved.push((parameter.name, value));
        }
        Ok(resolved)
    }
}
