use serde::{Deserialize, Serialize};

use super::FeatureType;

/// An ordered sequence of feature values tied to one catalog entry.
///
/// An absent vector and a stored zero-length vector are distinct states;
/// the cache keeps them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn into_values(self) -> Vec<f64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Fixed-size mapping over the whole feature catalog, each entry explicitly
/// absent until computed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCache {
    entries: [Option<FeatureVector>; FeatureType::COUNT],
}

impl FeatureCache {
    pub fn get(&self, feature_type: FeatureType) -> Option<&FeatureVector> {
        self.entries[feature_type.index()].as_ref()
    }

    /// Store a vector, overwriting any previous entry.
    pub fn set(&mut self, feature_type: FeatureType, vector: FeatureVector) {
        self.entries[feature_type.index()] = Some(vector);
    }

    pub fn is_populated(&self, feature_type: FeatureType) -> bool {
        self.entries[feature_type.index()].is_some()
    }

    /// Populated entries in catalog declaration order.
    pub fn populated(&self) -> impl Iterator<Item = (FeatureType, &FeatureVector)> {
        FeatureType::ALL
            .into_iter()
            .filter_map(|feature_type| self.get(feature_type).map(|vector| (feature_type, vector)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_start_absent() {
        let cache = FeatureCache::default();
        for feature_type in FeatureType::ALL {
            assert!(cache.get(feature_type).is_none());
            assert!(!cache.is_populated(feature_type));
        }
    }

    #[test]
    fn zero_length_vector_is_distinct_from_absent() {
        let mut cache = FeatureCache::default();
        cache.set(FeatureType::Mfcc, FeatureVector::from(Vec::new()));
        let stored = cache.get(FeatureType::Mfcc).unwrap();
        assert!(stored.is_empty());
        assert!(cache.is_populated(FeatureType::Mfcc));
        assert!(!cache.is_populated(FeatureType::PowerSpectrum));
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let mut cache = FeatureCache::default();
        cache.set(FeatureType::RootMeanSquare, FeatureVector::from(vec![1.0]));
        cache.set(FeatureType::RootMeanSquare, FeatureVector::from(vec![2.0]));
        assert_eq!(
            cache.get(FeatureType::RootMeanSquare).unwrap().values(),
            &[2.0]
        );
    }

    #[test]
    fn populated_preserves_declaration_order() {
        let mut cache = FeatureCache::default();
        cache.set(FeatureType::Mfcc, FeatureVector::from(vec![0.1]));
        cache.set(FeatureType::PowerSpectrum, FeatureVector::from(vec![0.2]));
        cache.set(FeatureType::ZeroCrossings, FeatureVector::from(vec![0.3]));
        let order: Vec<FeatureType> = cache.populated().map(|(ty, _)| ty).collect();
        assert_eq!(
            order,
            vec![
                FeatureType::PowerSpectrum,
                FeatureType::ZeroCrossings,
                FeatureType::Mfcc,
            ]
        );
    }
}
