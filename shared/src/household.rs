use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureCollection};
use crate::selection::SelectionSet;

pub const HOUSEHOLD_BARANGAY_KEY: &str = "BARANGAY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeGroups {
    pub infant: f64,
    pub child: f64,
    pub adult: f64,
    pub elderly: f64,
}

impl AgeGroups {
    pub fn total(&self) -> f64 {
        self.infant + self.child + self.adult + self.elderly
    }
}

/// Household and population figures for one barangay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarangayHouseholds {
    pub households: usize,
    pub male: f64,
    pub female: f64,
    pub age_groups: AgeGroups,
}

impl BarangayHouseholds {
    pub fn population(&self) -> f64 {
        self.male + self.female
    }

    fn add(&mut self, feature: &Feature) {
        self.households += 1;
        self.male += feature.property_f64("MALE");
        self.female += feature.property_f64("FEMALE");
        self.age_groups.infant += feature.property_f64("INFANT");
        self.age_groups.child += feature.property_f64("CHILD");
        self.age_groups.adult += feature.property_f64("ADULT");
        self.age_groups.elderly += feature.property_f64("ELDERLY");
    }

    fn merge(&mut self, other: &BarangayHouseholds) {
        self.households += other.households;
        self.male += other.male;
        self.female += other.female;
        self.age_groups.infant += other.age_groups.infant;
        self.age_groups.child += other.age_groups.child;
        self.age_groups.adult += other.age_groups.adult;
        self.age_groups.elderly += other.age_groups.elderly;
    }
}

/// Per-barangay household figures for the chart panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSummary {
    pub by_barangay: BTreeMap<String, BarangayHouseholds>,
}

impl HouseholdSummary {
    /// Summarise households in `barangays`. Selected barangays without data appear with zeros.
    pub fn for_barangays(collection: &FeatureCollection, barangays: &SelectionSet) -> Self {
        let mut by_barangay: BTreeMap<String, BarangayHouseholds> = barangays
            .iter()
            .map(|barangay| (barangay.clone(), BarangayHouseholds::default()))
            .collect();

        for feature in collection.iter() {
            let Some(barangay) = feature.property_str(HOUSEHOLD_BARANGAY_KEY) else {
                continue;
            };
            if let Some(entry) = by_barangay.get_mut(barangay) {
                entry.add(feature);
            }
        }

        Self { by_barangay }
    }

    pub fn totals(&self) -> BarangayHouseholds {
        let mut totals = BarangayHouseholds::default();
        for entry in self.by_barangay.values() {
            totals.merge(entry);
        }
        totals
    }

    pub fn is_empty(&self) -> bool {
        self.by_barangay.values().all(|entry| entry.households == 0)
    }
}
