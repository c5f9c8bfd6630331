//! Audio sources, sample buffers, and the per-file audio aggregate.

pub mod chunk;
pub mod format;
pub mod mixdown;
pub mod sample_buffer;
pub mod source;

use std::path::{Path, PathBuf};

use crate::error::{AudioError, SourceError};
use crate::feature::FeatureType;
use crate::feature::cache::{FeatureCache, FeatureVector};
use crate::recognizer::{RecognitionResult, RecognitionResultStore};

pub use chunk::SampleChunk;
pub use format::AudioFormat;
pub use sample_buffer::SampleBuffer;
pub use source::AudioSource;

/// Samples per channel delivered by one [`AudioSource::next_chunk`] window.
pub const BUFFER_SAMPLE_COUNT: usize = 1024;

/// One audio file together with its sample source, feature cache, and
/// recognition results.
///
/// Features and recognition results are mutated by the extraction engine and
/// by external recognizers respectively, never concurrently for the same
/// instance. Cloning yields an independent aggregate: a fresh lazily-opened
/// source plus deep copies of the populated feature entries and the result
/// store.
#[derive(Debug)]
pub struct Audio {
    name: String,
    path: PathBuf,
    source: AudioSource,
    features: FeatureCache,
    recognition_results: RecognitionResultStore,
}

impl Audio {
    /// Wrap an audio file. The file must exist and be a regular file; its
    /// content is not probed until the source is first read.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let path = path.into();
        if !path.exists() {
            return Err(AudioError::InvalidArgument(format!(
                "File \"{}\" does not exist",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(AudioError::InvalidArgument(format!(
                "\"{}\" is not a file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            source: AudioSource::new(&path),
            path,
            features: FeatureCache::default(),
            recognition_results: RecognitionResultStore::default(),
        })
    }

    /// File name of the underlying audio file.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_mut(&mut self) -> &mut AudioSource {
        &mut self.source
    }

    /// Detected format of the underlying source.
    pub fn format(&mut self) -> Result<AudioFormat, SourceError> {
        self.source.format()
    }

    /// Computed vector for `feature_type`, or `None` while absent. Absence
    /// is distinct from a stored zero-length vector.
    pub fn feature_vector(&self, feature_type: FeatureType) -> Option<&FeatureVector> {
        self.features.get(feature_type)
    }

    pub fn set_feature_vector(&mut self, feature_type: FeatureType, vector: FeatureVector) {
        self.features.set(feature_type, vector);
    }

    pub fn features(&self) -> &FeatureCache {
        &self.features
    }

    /// Populated cache entries in catalog declaration order.
    pub fn extracted_features(&self) -> Vec<(FeatureType, &FeatureVector)> {
        self.features.populated().collect()
    }

    pub fn recognition_results(&self) -> &RecognitionResultStore {
        &self.recognition_results
    }

    /// Attach a recognizer output under a generated unique key, which is
    /// returned. Existing entries are never overwritten.
    pub fn add_recognition_result(
        &mut self,
        result: RecognitionResult,
    ) -> Result<String, AudioError> {
        self.recognition_results.add_result(result)
    }

    pub fn has_recognition_results(&self) -> bool {
        self.recognition_results.has_results()
    }
}

impl Clone for Audio {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            // The clone re-opens lazily; stream position is not shared.
            source: AudioSource::new(&self.path),
            features: self.features.clone(),
            recognition_results: self.recognition_results.clone(),
        }
    }
}

impl PartialEq for Audio {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.features == other.features
    }
}
