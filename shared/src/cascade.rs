use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dataset::BoundaryDataset;
use crate::feature::LevelAttributes;
use crate::level::Level;
use crate::matcher::{MatchedFeatureSet, match_features};
use crate::selection::{SelectionSet, Selections};

/// Options offered at one level. A disabled level still lists every known value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionList {
    pub values: Vec<String>,
    pub enabled: bool,
}

impl OptionList {
    pub fn contains(&self, value: &str) -> bool {
        self.values.binary_search_by(|v| v.as_str().cmp(value)).is_ok()
    }
}

/// Values valid at `level` given the selections above it.
pub fn derive_options(
    dataset: &BoundaryDataset,
    selections: &Selections,
    level: Level,
) -> OptionList {
    if !selections.is_enabled(level) {
        return OptionList {
            values: dataset.all_values(level).to_vec(),
            enabled: false,
        };
    }

    let values: BTreeSet<&str> = dataset
        .features()
        .iter()
        .filter(|feature| {
            level
                .ancestors()
                .all(|ancestor| selections.admits(ancestor, feature.level_value(ancestor)))
        })
        .filter_map(|feature| feature.level_value(level))
        .collect();

    OptionList {
        values: values.into_iter().map(str::to_owned).collect(),
        enabled: true,
    }
}

/// Selection, option and match state of the location cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeState {
    selections: Selections,
    options: [OptionList; 4],
    matched: MatchedFeatureSet,
}

impl CascadeState {
    pub fn new(dataset: &BoundaryDataset) -> Self {
        let mut state = Self::default();
        state.recompute_from(dataset, Level::Region);
        state
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn options(&self, level: Level) -> &OptionList {
        &self.options[level.index()]
    }

    pub fn matched(&self) -> &MatchedFeatureSet {
        &self.matched
    }

    /// Replace the selection at `level` and cascade to the levels below.
    ///
    /// Returns false when the level's control is disabled and the change was ignored.
    pub fn on_level_change(
        &mut self,
        dataset: &BoundaryDataset,
        level: Level,
        values: SelectionSet,
    ) -> bool {
        if !self.selections.is_enabled(level) {
            warn!(%level, "ignoring selection on a disabled level");
            return false;
        }

        self.selections.set(level, values);
        let options = &self.options[level.index()];
        let dropped = self
            .selections
            .retain(level, |value| options.contains(value));
        if dropped > 0 {
            debug!(%level, dropped, "dropped values that are not offered at this level");
        }

        if self.selections.get(level).is_empty() {
            self.selections.clear_below(level);
        }

        if let Some(child) = level.child() {
            self.recompute_from(dataset, child);
        }
        self.rematch(dataset);
        true
    }

    pub fn toggle(
        &mut self,
        dataset: &BoundaryDataset,
        level: Level,
        value: &str,
        checked: bool,
    ) -> bool {
        let mut values = self.selections.get(level).clone();
        if checked {
            values.insert(value.to_owned());
        } else {
            values.remove(value);
        }
        self.on_level_change(dataset, level, values)
    }

    pub fn clear_level(&mut self, dataset: &BoundaryDataset, level: Level) -> bool {
        self.on_level_change(dataset, level, SelectionSet::new())
    }

    pub fn reset(&mut self, dataset: &BoundaryDataset) {
        self.selections.clear_all();
        self.recompute_from(dataset, Level::Region);
        self.rematch(dataset);
    }

    /// Rebuild option lists from `start` downwards, pruning selections that fell out of them.
    fn recompute_from(&mut self, dataset: &BoundaryDataset, start: Level) {
        for level in Level::ALL.into_iter().skip(start.index()) {
            let options = derive_options(dataset, &self.selections, level);
            if options.enabled {
                let dropped = self.selections.retain(level, |value| options.contains(value));
                if dropped > 0 {
                    debug!(%level, dropped, "pruned selections outside the derived options");
                }
            } else {
                self.selections.clear(level);
            }
            self.options[level.index()] = options;
        }
    }

    fn rematch(&mut self, dataset: &BoundaryDataset) {
        self.matched = match_features(dataset.features(), &self.selections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::BoundaryFeature;

    fn dataset() -> BoundaryDataset {
        BoundaryDataset::new(vec![
            BoundaryFeature::new("Reg1", "Prov1", "Mun1", "A"),
            BoundaryFeature::new("Reg1", "Prov1", "Mun1", "B"),
            BoundaryFeature::new("Reg1", "Prov1", "Mun2", "C"),
            BoundaryFeature::new("Reg1", "Prov2", "Mun3", "D"),
            BoundaryFeature::new("Reg2", "Prov3", "Mun4", "E"),
        ])
    }

    fn set(values: &[&str]) -> SelectionSet {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn initial_state_enables_only_regions() {
        let dataset = dataset();
        let state = CascadeState::new(&dataset);

        assert!(state.options(Level::Region).enabled);
        assert_eq!(state.options(Level::Region).values, vec!["Reg1", "Reg2"]);
        for level in Level::Region.descendants() {
            let options = state.options(level);
            assert!(!options.enabled, "{level} should start disabled");
            assert_eq!(options.values, dataset.all_values(level));
        }
        assert!(state.matched().is_empty());
    }

    #[test]
    fn region_change_narrows_provinces() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);

        assert!(state.on_level_change(&dataset, Level::Region, set(&["Reg1"])));

        let provinces = state.options(Level::Province);
        assert!(provinces.enabled);
        assert_eq!(provinces.values, vec!["Prov1", "Prov2"]);
        assert!(!state.options(Level::Municipality).enabled);
        assert_eq!(state.matched().len(), 4);
    }

    #[test]
    fn cascade_selects_down_to_municipality() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);

        state.toggle(&dataset, Level::Region, "Reg1", true);
        state.toggle(&dataset, Level::Province, "Prov1", true);
        state.toggle(&dataset, Level::Municipality, "Mun1", true);

        assert_eq!(state.options(Level::Barangay).values, vec!["A", "B"]);
        let matched: Vec<_> = state
            .matched()
            .resolve(dataset.features())
            .filter_map(|feature| feature.barangay.as_deref())
            .collect();
        assert_eq!(matched, vec!["A", "B"]);
    }

    #[test]
    fn clearing_region_empties_every_descendant() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);
        state.toggle(&dataset, Level::Region, "Reg1", true);
        state.toggle(&dataset, Level::Province, "Prov1", true);
        state.toggle(&dataset, Level::Municipality, "Mun1", true);
        state.toggle(&dataset, Level::Barangay, "A", true);

        state.clear_level(&dataset, Level::Region);

        for level in Level::ALL {
            assert!(state.selections().get(level).is_empty(), "{level} not cleared");
        }
        for level in Level::Region.descendants() {
            assert!(!state.options(level).enabled);
        }
        assert!(state.matched().is_empty());
    }

    #[test]
    fn disabled_level_ignores_changes() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);

        assert!(!state.on_level_change(&dataset, Level::Municipality, set(&["Mun1"])));
        assert!(state.selections().get(Level::Municipality).is_empty());
    }

    #[test]
    fn narrowing_a_parent_prunes_orphaned_children() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);
        state.on_level_change(&dataset, Level::Region, set(&["Reg1", "Reg2"]));
        state.on_level_change(&dataset, Level::Province, set(&["Prov1", "Prov3"]));
        state.on_level_change(&dataset, Level::Municipality, set(&["Mun1", "Mun4"]));

        state.toggle(&dataset, Level::Region, "Reg2", false);

        assert_eq!(state.selections().get(Level::Province), &set(&["Prov1"]));
        assert_eq!(state.selections().get(Level::Municipality), &set(&["Mun1"]));
        assert!(!state.options(Level::Municipality).contains("Mun4"));
    }

    #[test]
    fn recompute_is_idempotent() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);
        state.on_level_change(&dataset, Level::Region, set(&["Reg1"]));
        state.on_level_change(&dataset, Level::Province, set(&["Prov1", "Prov2"]));

        let snapshot = state.clone();
        let current = state.selections().get(Level::Province).clone();
        state.on_level_change(&dataset, Level::Province, current);

        assert_eq!(state, snapshot);
    }

    #[test]
    fn values_outside_the_offered_options_are_dropped() {
        let dataset = dataset();
        let mut state = CascadeState::new(&dataset);
        state.on_level_change(&dataset, Level::Region, set(&["Reg1", "Atlantis"]));

        assert_eq!(state.selections().get(Level::Region), &set(&["Reg1"]));
    }
}
