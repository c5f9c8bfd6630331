use super::FeatureType;

/// Expand a requested set to its transitive prerequisite closure and order
/// it topologically.
///
/// Every prerequisite is placed strictly before its dependents; ties among
/// independent types are broken by catalog declaration order, so the result
/// is stable and deterministic for a given request. Duplicates in the
/// request collapse into one entry.
pub fn resolution_order(requested: &[FeatureType]) -> Vec<FeatureType> {
    let mut in_closure = [false; FeatureType::COUNT];
    let mut frontier: Vec<FeatureType> = requested.to_vec();
    while let Some(feature_type) = frontier.pop() {
        if in_closure[feature_type.index()] {
            continue;
        }
        in_closure[feature_type.index()] = true;
        frontier.extend_from_slice(feature_type.prerequisites());
    }
    let closure_len = in_closure.iter().filter(|present| **present).count();

    let mut ordered = Vec::with_capacity(closure_len);
    let mut placed = [false; FeatureType::COUNT];
    while ordered.len() < closure_len {
        let before = ordered.len();
        for feature_type in FeatureType::ALL {
            if !in_closure[feature_type.index()] || placed[feature_type.index()] {
                continue;
            }
            if feature_type
                .prerequisites()
                .iter()
                .all(|prerequisite| placed[prerequisite.index()])
            {
                placed[feature_type.index()] = true;
                ordered.push(feature_type);
            }
        }
        // The catalog is acyclic, so every pass over a non-empty remainder
        // places at least one type.
        debug_assert!(
            ordered.len() > before,
            "prerequisite graph made no progress"
        );
        if ordered.len() == before {
            break;
        }
    }
    ordered
}
