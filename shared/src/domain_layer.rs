use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dataset::BoundaryDataset;
use crate::feature::{
    AttributeKeys, BARANGAY_KEY, Feature, FeatureCollection, KeyedFeature, MUNICIPALITY_KEY,
};
use crate::level::Level;
use crate::map_view::{MapView, Notice, layer_ids};
use crate::matcher::match_features;
use crate::selection::Selections;

/// Z-index of filtered domain renditions; below the highlight overlay.
pub const PRESENTATION_Z_INDEX: i32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Households,
    Schools,
    MunicipalityAggregates,
}

impl DomainKind {
    pub const ALL: [DomainKind; 3] = [
        DomainKind::Households,
        DomainKind::Schools,
        DomainKind::MunicipalityAggregates,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DomainKind::Households => "households",
            DomainKind::Schools => "schools",
            DomainKind::MunicipalityAggregates => "municipality aggregates",
        })
    }
}

/// How one domain dataset plugs into the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSpec {
    pub kind: DomainKind,
    pub keys: AttributeKeys,
    /// The layer shipped with the project, hidden while the domain is active.
    pub base_layer: String,
    /// Singular noun used in notices, e.g. "household".
    pub noun: String,
}

impl DomainSpec {
    pub fn households() -> Self {
        Self {
            kind: DomainKind::Households,
            keys: AttributeKeys::new().with(Level::Barangay, "BARANGAY"),
            base_layer: layer_ids::HOUSEHOLDS.to_owned(),
            noun: "household".to_owned(),
        }
    }

    pub fn schools() -> Self {
        Self {
            kind: DomainKind::Schools,
            keys: AttributeKeys::new().with(Level::Barangay, BARANGAY_KEY),
            base_layer: layer_ids::SCHOOLS.to_owned(),
            noun: "school".to_owned(),
        }
    }

    pub fn municipality_aggregates() -> Self {
        Self {
            kind: DomainKind::MunicipalityAggregates,
            keys: AttributeKeys::new().with(Level::Municipality, MUNICIPALITY_KEY),
            base_layer: layer_ids::MUNICIPALITY_AGGREGATES.to_owned(),
            noun: "aggregate".to_owned(),
        }
    }

    pub fn for_kind(kind: DomainKind) -> Self {
        match kind {
            DomainKind::Households => Self::households(),
            DomainKind::Schools => Self::schools(),
            DomainKind::MunicipalityAggregates => Self::municipality_aggregates(),
        }
    }

    pub fn presentation_layer(&self, rendition: Rendition) -> String {
        match rendition {
            Rendition::Barangay => format!("{}_barangay_filtered", self.base_layer),
            Rendition::Municipality => format!("{}_municipality_filtered", self.base_layer),
        }
    }

    pub fn empty_notice(&self, rendition: Rendition) -> String {
        format!(
            "No {} data within this {}!",
            self.noun,
            rendition.level().title()
        )
    }
}

/// Which selection level a filtered rendition is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendition {
    Municipality,
    Barangay,
}

impl Rendition {
    pub fn level(self) -> Level {
        match self {
            Rendition::Municipality => Level::Municipality,
            Rendition::Barangay => Level::Barangay,
        }
    }

    fn other(self) -> Rendition {
        match self {
            Rendition::Municipality => Rendition::Barangay,
            Rendition::Barangay => Rendition::Municipality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainState {
    Inactive,
    ActiveUnfiltered,
    FilteredByMunicipality,
    FilteredByBarangay,
}

impl DomainState {
    pub fn is_active(self) -> bool {
        self != DomainState::Inactive
    }

    /// Barangay filtering wins whenever both levels carry a selection.
    pub fn for_selections(selections: &Selections) -> DomainState {
        if !selections.get(Level::Barangay).is_empty() {
            DomainState::FilteredByBarangay
        } else if !selections.get(Level::Municipality).is_empty() {
            DomainState::FilteredByMunicipality
        } else {
            DomainState::ActiveUnfiltered
        }
    }

    fn rendition(self) -> Option<Rendition> {
        match self {
            DomainState::FilteredByBarangay => Some(Rendition::Barangay),
            DomainState::FilteredByMunicipality => Some(Rendition::Municipality),
            _ => None,
        }
    }
}

/// Activation and filter state of one dependent domain layer.
#[derive(Debug, Clone)]
pub struct DomainLayer {
    spec: DomainSpec,
    state: DomainState,
    dataset: Option<FeatureCollection>,
    recheck_armed: bool,
    filtered: usize,
}

impl DomainLayer {
    pub fn new(spec: DomainSpec) -> Self {
        Self {
            spec,
            state: DomainState::Inactive,
            dataset: None,
            recheck_armed: false,
            filtered: 0,
        }
    }

    pub fn spec(&self) -> &DomainSpec {
        &self.spec
    }

    pub fn kind(&self) -> DomainKind {
        self.spec.kind
    }

    pub fn state(&self) -> DomainState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_ready(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<&FeatureCollection> {
        self.dataset.as_ref()
    }

    pub fn recheck_armed(&self) -> bool {
        self.recheck_armed
    }

    /// Number of features in the visible filtered rendition.
    pub fn filtered_count(&self) -> usize {
        self.filtered
    }

    /// Store the domain collection. Returns true when a deferred activation should now run.
    pub fn set_dataset(&mut self, collection: FeatureCollection) -> bool {
        info!(domain = %self.spec.kind, features = collection.len(), "domain dataset ready");
        self.dataset = Some(collection);
        std::mem::take(&mut self.recheck_armed)
    }

    /// Master toggle switched on. Returns false when the dataset is missing and activation was
    /// deferred to its ready event.
    pub fn activate<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        boundaries: &BoundaryDataset,
        selections: &Selections,
    ) -> bool {
        if self.is_active() {
            return true;
        }
        if self.dataset.is_none() {
            if !self.recheck_armed {
                warn!(domain = %self.spec.kind, "domain dataset not loaded yet; will retry once when it arrives");
            }
            self.recheck_armed = true;
            return false;
        }

        map.set_visible(&self.spec.base_layer, false);
        for rendition in [Rendition::Barangay, Rendition::Municipality] {
            let id = self.spec.presentation_layer(rendition);
            map.add_layer(&id, PRESENTATION_Z_INDEX);
            map.replace_features(&id, Vec::new());
            map.set_visible(&id, false);
        }
        self.state = DomainState::ActiveUnfiltered;
        debug!(domain = %self.spec.kind, "domain layer activated");

        self.refresh(map, boundaries, selections);
        true
    }

    /// Master toggle switched off: drop both renditions and restore the base layer.
    pub fn deactivate<M: MapView + ?Sized>(&mut self, map: &mut M) {
        self.recheck_armed = false;
        if !self.is_active() {
            return;
        }
        for rendition in [Rendition::Barangay, Rendition::Municipality] {
            map.remove_layer(&self.spec.presentation_layer(rendition));
        }
        map.set_visible(&self.spec.base_layer, true);
        self.state = DomainState::Inactive;
        self.filtered = 0;
        debug!(domain = %self.spec.kind, "domain layer deactivated");
    }

    /// Re-run the filter against the current selections. No-op while inactive.
    pub fn refresh<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        boundaries: &BoundaryDataset,
        selections: &Selections,
    ) -> DomainState {
        if !self.is_active() {
            return self.state;
        }
        let Some(collection) = self.dataset.as_ref() else {
            return self.state;
        };

        let next = DomainState::for_selections(selections);
        let Some(rendition) = next.rendition() else {
            for rendition in [Rendition::Barangay, Rendition::Municipality] {
                clear_rendition(map, &self.spec, rendition);
            }
            self.state = next;
            self.filtered = 0;
            return next;
        };

        let filter = self.filter_for(rendition, boundaries, selections);
        let features: Vec<Feature> = match filter {
            Some(filter) => {
                let keyed: Vec<KeyedFeature<'_>> = collection
                    .iter()
                    .map(|feature| KeyedFeature {
                        feature,
                        keys: &self.spec.keys,
                    })
                    .collect();
                match_features(&keyed, &filter)
                    .resolve(&keyed)
                    .map(|keyed| keyed.feature.clone())
                    .collect()
            }
            None => Vec::new(),
        };

        clear_rendition(map, &self.spec, rendition.other());
        let id = self.spec.presentation_layer(rendition);
        self.filtered = features.len();
        map.replace_features(&id, features);
        map.set_visible(&id, true);
        self.state = next;

        if self.filtered == 0 {
            warn!(domain = %self.spec.kind, ?rendition, "no features within the selection");
            map.notify(Notice::warning(self.spec.empty_notice(rendition)));
        } else {
            debug!(domain = %self.spec.kind, ?rendition, count = self.filtered, "domain filtered");
        }
        next
    }

    /// Selection to match the domain collection against, expressed in the levels the domain
    /// actually carries. `None` when nothing can match.
    fn filter_for(
        &self,
        rendition: Rendition,
        boundaries: &BoundaryDataset,
        selections: &Selections,
    ) -> Option<Selections> {
        let level = rendition.level();
        let selected = selections.get(level);

        if self.spec.keys.get(level).is_some() {
            return Some(Selections::new().with(level, selected.iter().cloned()));
        }

        let translated: BTreeSet<String> = match rendition {
            Rendition::Municipality if self.spec.keys.get(Level::Barangay).is_some() => {
                let barangays = boundaries.barangays_in(selected);
                barangays.into_iter().map(str::to_owned).collect()
            }
            Rendition::Barangay if self.spec.keys.get(Level::Municipality).is_some() => selected
                .iter()
                .filter_map(|barangay| boundaries.municipality_of(barangay))
                .map(str::to_owned)
                .collect(),
            _ => {
                warn!(domain = %self.spec.kind, ?rendition, "domain has no attribute to filter on");
                return None;
            }
        };

        if translated.is_empty() {
            return None;
        }
        let target = rendition.other().level();
        Some(Selections::new().with(target, translated))
    }
}

fn clear_rendition<M: MapView + ?Sized>(map: &mut M, spec: &DomainSpec, rendition: Rendition) {
    let id = spec.presentation_layer(rendition);
    map.replace_features(&id, Vec::new());
    map.set_visible(&id, false);
}
