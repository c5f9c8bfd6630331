//! Signal-processing building blocks shared by the feature extractors.

pub mod fir;
pub mod spectrum;

pub use fir::FirFilter;
