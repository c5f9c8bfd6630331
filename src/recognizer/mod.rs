//! Speech-recognizer integration surface: result values and the per-audio
//! result store. Recognizer back ends live outside this crate; their only
//! contract is [`Recognizer`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audio::Audio;
use crate::error::{AudioError, SourceError};

/// External speech-recognition back end.
///
/// Implementations read the audio's re-readable source (for example through
/// [`crate::audio::mixdown::samples_mixed_down`]) and return one result,
/// which callers attach to the audio's result store.
pub trait Recognizer {
    /// Declared name, used to derive store keys.
    fn name(&self) -> &str;

    fn recognize(&mut self, audio: &mut Audio) -> Result<RecognitionResult, SourceError>;
}

/// Transcript, confidence, and metadata reported by one recognizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    recognizer: String,
    transcript: String,
    confidence: f64,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl RecognitionResult {
    /// Sentinel confidence for recognizers that do not report one.
    pub const UNKNOWN_CONFIDENCE: f64 = -1.0;

    /// Metadata key carrying the recognizer's declared name.
    pub const NAME_KEY: &'static str = "name";

    pub fn new(recognizer: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self::with_confidence(recognizer, transcript, Self::UNKNOWN_CONFIDENCE)
    }

    pub fn with_confidence(
        recognizer: impl Into<String>,
        transcript: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let recognizer = recognizer.into();
        let mut metadata = BTreeMap::new();
        metadata.insert(
            Self::NAME_KEY.to_string(),
            serde_json::Value::String(recognizer.clone()),
        );
        Self {
            recognizer,
            transcript: transcript.into(),
            confidence,
            metadata,
        }
    }

    pub fn recognizer_name(&self) -> &str {
        &self.recognizer
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn set_transcript(&mut self, transcript: impl Into<String>) {
        self.transcript = transcript.into();
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence;
    }

    pub fn has_confidence(&self) -> bool {
        self.confidence != Self::UNKNOWN_CONFIDENCE
    }

    /// Recognizer-specific metadata value, if present.
    pub fn metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }
}

impl fmt::Display for RecognitionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.transcript)
    }
}

/// Insertion-ordered collection of recognizer outputs, keyed by generated
/// unique strings derived from the recognizer names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResultStore {
    entries: Vec<(String, RecognitionResult)>,
}

impl RecognitionResultStore {
    /// Attach a result under a fresh key derived from the recognizer's
    /// declared name. Name collisions get a numeric suffix so existing
    /// entries are never overwritten. The generated key is returned.
    pub fn add_result(&mut self, result: RecognitionResult) -> Result<String, AudioError> {
        let base = result.recognizer_name().trim();
        if base.is_empty() {
            return Err(AudioError::InvalidArgument(
                "recognition result has no recognizer name".to_string(),
            ));
        }
        let key = self.unique_key(base);
        self.entries.push((key.clone(), result));
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Option<&RecognitionResult> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, result)| result)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecognitionResult)> {
        self.entries
            .iter()
            .map(|(key, result)| (key.as_str(), result))
    }

    pub fn has_results(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unique_key(&self, base: &str) -> String {
        let taken = |candidate: &str| self.entries.iter().any(|(key, _)| key == candidate);
        if !taken(base) {
            return base.to_string();
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base} (#{suffix})");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
