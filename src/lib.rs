//! Audio sample streaming and acoustic feature extraction.
//!
//! Audio files are decoded into lazily-streamed PCM chunks, converted to
//! scaled sample buffers, mixed down to mono, and run through a catalog of
//! acoustic feature extractors under an explicit dependency graph. Results
//! are cached per audio instance; speech-recognizer outputs attach to the
//! same instance.

/// Audio sources, sample buffers, and the per-file audio aggregate.
pub mod audio;
/// Signal-processing building blocks.
pub mod dsp;
/// Error taxonomy shared across the pipeline.
pub mod error;
/// Feature catalog, dependency resolution, and extraction engine.
pub mod feature;
/// Speech-recognizer integration surface.
pub mod recognizer;
