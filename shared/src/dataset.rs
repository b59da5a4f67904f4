use std::collections::{BTreeSet, HashMap};

use crate::feature::{BoundaryFeature, FeatureCollection, LevelAttributes};
use crate::level::Level;

/// Boundary polygons plus the lookups derived from them once at load time.
#[derive(Debug, Clone, Default)]
pub struct BoundaryDataset {
    features: Vec<BoundaryFeature>,
    all_values: [Vec<String>; 4],
    barangay_municipality: HashMap<String, String>,
}

impl BoundaryDataset {
    pub fn new(features: Vec<BoundaryFeature>) -> Self {
        let mut unique: [BTreeSet<&str>; 4] = Default::default();
        let mut barangay_municipality = HashMap::new();

        for feature in &features {
            for level in Level::ALL {
                if let Some(value) = feature.level_value(level) {
                    unique[level.index()].insert(value);
                }
            }
            // A barangay name reused across municipalities maps to the last one seen.
            if let (Some(barangay), Some(municipality)) =
                (feature.barangay.as_ref(), feature.municipality.as_ref())
            {
                barangay_municipality.insert(barangay.clone(), municipality.clone());
            }
        }

        let all_values = unique.map(|values| {
            values
                .into_iter()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        });

        Self {
            features,
            all_values,
            barangay_municipality,
        }
    }

    pub fn from_collection(collection: &FeatureCollection) -> Self {
        Self::new(
            collection
                .iter()
                .map(BoundaryFeature::from_feature)
                .collect(),
        )
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every distinct, non-blank value at `level`, sorted.
    pub fn all_values(&self, level: Level) -> &[String] {
        &self.all_values[level.index()]
    }

    pub fn municipality_of(&self, barangay: &str) -> Option<&str> {
        self.barangay_municipality.get(barangay).map(String::as_str)
    }

    /// Barangays whose municipality is one of `municipalities`.
    pub fn barangays_in<'a, I>(&'a self, municipalities: I) -> BTreeSet<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let wanted: BTreeSet<&str> = municipalities.into_iter().map(String::as_str).collect();
        self.barangay_municipality
            .iter()
            .filter(|(_, municipality)| wanted.contains(municipality.as_str()))
            .map(|(barangay, _)| barangay.as_str())
            .collect()
    }
}
