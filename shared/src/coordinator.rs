use tracing::{debug, info, warn};

use crate::bounds::{Extent, Projection};
use crate::cascade::{CascadeState, OptionList};
use crate::dataset::BoundaryDataset;
use crate::domain_layer::{DomainKind, DomainLayer, DomainSpec, DomainState};
use crate::feature::{BoundaryFeature, FeatureCollection};
use crate::flood_extent::FloodExtentSelector;
use crate::highlight::{HighlightDriver, HighlightOutcome};
use crate::household::HouseholdSummary;
use crate::level::Level;
use crate::map_view::{MapView, layer_ids};
use crate::selection::{SelectionSet, Selections};
use crate::viewport::{FitOptions, View};

pub const SETTLE_DELAY_MS: f64 = 50.0;
pub const INITIAL_SCALE: f64 = 4_453_347.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Quiet period after the last selection change before highlight and domain layers rerun.
    pub settle_ms: f64,
    pub fit: FitOptions,
    pub projection: Projection,
    pub boundary_layer: String,
    pub highlight_layer: String,
    /// Scale denominator of the initial view.
    pub initial_scale: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: SETTLE_DELAY_MS,
            fit: FitOptions::default(),
            projection: Projection::default(),
            boundary_layer: layer_ids::BOUNDARIES.to_owned(),
            highlight_layer: layer_ids::HIGHLIGHT.to_owned(),
            initial_scale: INITIAL_SCALE,
        }
    }
}

/// Owns the cascade and everything that reacts to it.
///
/// Selection changes update option lists immediately; the highlight, domain layers and flood
/// extent picker follow once the selection has been quiet for `settle_ms`. Callers feed their
/// clock through `poll`.
#[derive(Debug)]
pub struct CascadeCoordinator {
    config: CoordinatorConfig,
    dataset: BoundaryDataset,
    boundaries_ready: bool,
    cascade: CascadeState,
    highlight: HighlightDriver,
    domains: [DomainLayer; 3],
    flood: FloodExtentSelector,
    pending_since: Option<f64>,
    last_highlight: Option<HighlightOutcome>,
}

impl Default for CascadeCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl CascadeCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let highlight = HighlightDriver::new(
            config.highlight_layer.clone(),
            config.fit,
            config.projection,
        );
        Self {
            highlight,
            dataset: BoundaryDataset::default(),
            boundaries_ready: false,
            cascade: CascadeState::default(),
            domains: DomainKind::ALL.map(|kind| DomainLayer::new(DomainSpec::for_kind(kind))),
            flood: FloodExtentSelector::new(),
            pending_since: None,
            last_highlight: None,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn boundaries_ready(&self) -> bool {
        self.boundaries_ready
    }

    pub fn dataset(&self) -> &BoundaryDataset {
        &self.dataset
    }

    pub fn selections(&self) -> &Selections {
        self.cascade.selections()
    }

    pub fn options(&self, level: Level) -> &OptionList {
        self.cascade.options(level)
    }

    pub fn summary_label(&self, level: Level) -> String {
        self.cascade.selections().summary_label(level)
    }

    pub fn matched_features(&self) -> impl Iterator<Item = &BoundaryFeature> {
        self.cascade.matched().resolve(self.dataset.features())
    }

    pub fn matched_count(&self) -> usize {
        self.cascade.matched().len()
    }

    pub fn domain(&self, kind: DomainKind) -> &DomainLayer {
        &self.domains[kind.index()]
    }

    pub fn domain_state(&self, kind: DomainKind) -> DomainState {
        self.domain(kind).state()
    }

    pub fn flood_extent(&self) -> &FloodExtentSelector {
        &self.flood
    }

    pub fn last_highlight(&self) -> Option<HighlightOutcome> {
        self.last_highlight
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Starting view: centred on the boundary data at the configured scale.
    pub fn initial_view(&self) -> Option<View> {
        let extent = Extent::union_of(
            self.dataset
                .features()
                .iter()
                .filter_map(|feature| feature.geometry.as_ref()),
        )?;
        let (center_x, center_y) = self.config.projection.project_extent(&extent).center();
        Some(View::new(
            center_x,
            center_y,
            View::resolution_for_scale(self.config.initial_scale),
        ))
    }

    /// Ready event for the boundary collection. Resets every selection and schedules a refresh
    /// so the highlight and domain layers drop anything built from the previous selection.
    pub fn on_boundaries_ready(&mut self, collection: &FeatureCollection, now_ms: f64) {
        self.dataset = BoundaryDataset::from_collection(collection);
        self.cascade = CascadeState::new(&self.dataset);
        self.boundaries_ready = true;
        self.schedule(now_ms);
        info!(
            features = self.dataset.features().len(),
            regions = self.dataset.all_values(Level::Region).len(),
            "boundary dataset ready"
        );
    }

    /// Ready event for a domain collection; runs a deferred activation if one is armed.
    pub fn on_domain_ready<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        kind: DomainKind,
        collection: FeatureCollection,
    ) {
        let recheck = self.domains[kind.index()].set_dataset(collection);
        if recheck {
            debug!(domain = %kind, "running deferred activation");
            self.on_domain_toggle(map, kind, true);
        }
    }

    /// Replace the selection at `level`. Returns false when the change was ignored.
    pub fn on_level_change(&mut self, level: Level, values: SelectionSet, now_ms: f64) -> bool {
        if !self.boundaries_ready {
            warn!(%level, "boundary dataset not loaded; ignoring selection change");
            return false;
        }
        let applied = self.cascade.on_level_change(&self.dataset, level, values);
        if applied {
            self.schedule(now_ms);
        }
        applied
    }

    pub fn toggle_value(&mut self, level: Level, value: &str, checked: bool, now_ms: f64) -> bool {
        if !self.boundaries_ready {
            warn!(%level, value, "boundary dataset not loaded; ignoring toggle");
            return false;
        }
        let applied = self.cascade.toggle(&self.dataset, level, value, checked);
        if applied {
            self.schedule(now_ms);
        }
        applied
    }

    pub fn clear_level(&mut self, level: Level, now_ms: f64) -> bool {
        self.on_level_change(level, SelectionSet::new(), now_ms)
    }

    pub fn reset(&mut self, now_ms: f64) {
        self.cascade.reset(&self.dataset);
        self.schedule(now_ms);
    }

    /// Master toggle of a domain layer. Returns the domain's state afterwards.
    pub fn on_domain_toggle<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        kind: DomainKind,
        active: bool,
    ) -> DomainState {
        let domain = &mut self.domains[kind.index()];
        if active {
            if domain.activate(map, &self.dataset, self.cascade.selections()) {
                map.set_visible(&self.config.boundary_layer, false);
            }
        } else {
            domain.deactivate(map);
            if !self.domains.iter().any(DomainLayer::is_active) {
                map.set_visible(&self.config.boundary_layer, true);
            }
        }
        self.domains[kind.index()].state()
    }

    pub fn select_flood_extent<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        depth: Option<u8>,
    ) -> bool {
        self.flood.select(map, depth)
    }

    /// Household figures for the selected barangays, once households are loaded.
    pub fn household_summary(&self) -> Option<HouseholdSummary> {
        let barangays = self.cascade.selections().get(Level::Barangay);
        if barangays.is_empty() {
            return None;
        }
        let households = self.domain(DomainKind::Households).dataset()?;
        Some(HouseholdSummary::for_barangays(households, barangays))
    }

    /// Run the settled refresh if the selection has been quiet long enough.
    pub fn poll<M: MapView + ?Sized>(&mut self, map: &mut M, now_ms: f64) -> bool {
        match self.pending_since {
            Some(since) if now_ms - since >= self.config.settle_ms => {
                self.refresh(map, now_ms);
                true
            }
            _ => false,
        }
    }

    /// Push the current selection to the highlight, domain layers and flood extent picker.
    pub fn refresh<M: MapView + ?Sized>(&mut self, map: &mut M, now_ms: f64) {
        self.pending_since = None;

        let outcome = self.highlight.apply(
            map,
            self.cascade.matched().resolve(self.dataset.features()),
            now_ms,
        );
        self.last_highlight = Some(outcome);

        let selections = self.cascade.selections();
        for domain in &mut self.domains {
            domain.refresh(map, &self.dataset, selections);
        }

        let barangay_selected = !selections.get(Level::Barangay).is_empty();
        self.flood.set_enabled(map, barangay_selected);
        debug!(matched = self.cascade.matched().len(), ?outcome, "selection refreshed");
    }

    fn schedule(&mut self, now_ms: f64) {
        // A later change restarts the quiet period.
        self.pending_since = Some(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon};
    use serde_json::json;

    use super::*;
    use crate::domain_layer::Rendition;
    use crate::feature::Feature;
    use crate::map_view::testing::RecordingMap;

    fn boundary_collection() -> FeatureCollection {
        let feature = |mun: &str, bgy: &str, x: f64| {
            Feature::new(Some(
                Polygon::new(
                    LineString::from(vec![(x, 13.0), (x + 0.1, 13.0), (x + 0.1, 13.1), (x, 13.0)]),
                    Vec::new(),
                )
                .into(),
            ))
            .with_property("Reg_Nme", "Reg1")
            .with_property("Pro_Name", "Prov1")
            .with_property("Mun_Name", mun)
            .with_property("Bgy_Name", bgy)
        };
        FeatureCollection::new(vec![
            feature("Mun1", "Alpha", 123.0),
            feature("Mun1", "Beta", 123.2),
            feature("Mun2", "Gamma", 123.4),
        ])
    }

    fn households() -> FeatureCollection {
        FeatureCollection::from_geojson_value(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"BARANGAY": "Alpha", "MALE": 2, "FEMALE": 1}, "geometry": null},
                {"type": "Feature", "properties": {"BARANGAY": "Alpha", "MALE": "1", "FEMALE": 1}, "geometry": null},
                {"type": "Feature", "properties": {"BARANGAY": "Alpha", "MALE": 0, "FEMALE": 3}, "geometry": null}
            ]
        }))
        .expect("households parse")
    }

    fn ready() -> (CascadeCoordinator, RecordingMap) {
        let mut coordinator = CascadeCoordinator::default();
        coordinator.on_boundaries_ready(&boundary_collection(), 0.0);
        let map = RecordingMap::sized(1_024.0, 768.0)
            .with_layer(layer_ids::BOUNDARIES)
            .with_layer(layer_ids::HOUSEHOLDS);
        (coordinator, map)
    }

    fn select_down_to(coordinator: &mut CascadeCoordinator, municipality: &str, now: f64) {
        coordinator.toggle_value(Level::Region, "Reg1", true, now);
        coordinator.toggle_value(Level::Province, "Prov1", true, now);
        coordinator.toggle_value(Level::Municipality, municipality, true, now);
    }

    #[test]
    fn selection_before_boundaries_is_ignored() {
        let mut coordinator = CascadeCoordinator::default();
        assert!(!coordinator.toggle_value(Level::Region, "Reg1", true, 0.0));
        assert!(!coordinator.has_pending_refresh());
    }

    #[test]
    fn refresh_waits_for_the_settle_delay() {
        let (mut coordinator, mut map) = ready();
        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.toggle_value(Level::Barangay, "Alpha", true, 30.0);

        assert!(!coordinator.poll(&mut map, 60.0));
        assert!(map.animations.is_empty());

        assert!(coordinator.poll(&mut map, 80.0));
        assert!(!coordinator.has_pending_refresh());
        assert_eq!(map.feature_count(layer_ids::HIGHLIGHT), 1);
        assert_eq!(map.animations.len(), 1);
        assert!(matches!(
            coordinator.last_highlight(),
            Some(HighlightOutcome::Fitted(_))
        ));
    }

    #[test]
    fn municipality_selection_highlights_its_barangays() {
        let (mut coordinator, mut map) = ready();
        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.refresh(&mut map, 0.0);

        let matched: Vec<_> = coordinator
            .matched_features()
            .filter_map(|feature| feature.barangay.as_deref())
            .collect();
        assert_eq!(matched, vec!["Alpha", "Beta"]);
        assert_eq!(coordinator.options(Level::Barangay).values, vec!["Alpha", "Beta"]);
        assert_eq!(coordinator.summary_label(Level::Municipality), "1 selected municipality");
    }

    #[test]
    fn clearing_region_clears_highlight() {
        let (mut coordinator, mut map) = ready();
        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.refresh(&mut map, 0.0);

        coordinator.clear_level(Level::Region, 100.0);
        coordinator.poll(&mut map, 200.0);

        assert_eq!(coordinator.matched_count(), 0);
        assert_eq!(map.feature_count(layer_ids::HIGHLIGHT), 0);
        assert_eq!(coordinator.last_highlight(), Some(HighlightOutcome::Cleared));
    }

    #[test]
    fn households_follow_barangay_then_fall_back_to_municipality() {
        let (mut coordinator, mut map) = ready();
        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());

        let state = coordinator.on_domain_toggle(&mut map, DomainKind::Households, true);
        assert_eq!(state, DomainState::ActiveUnfiltered);
        assert!(!map.is_visible(layer_ids::BOUNDARIES));
        assert!(!map.is_visible(layer_ids::HOUSEHOLDS));

        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.refresh(&mut map, 0.0);
        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::FilteredByMunicipality
        );

        coordinator.toggle_value(Level::Barangay, "Alpha", true, 10.0);
        coordinator.refresh(&mut map, 10.0);
        let spec = coordinator.domain(DomainKind::Households).spec().clone();
        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::FilteredByBarangay
        );
        assert!(map.is_visible(&spec.presentation_layer(Rendition::Barangay)));
        assert!(!map.is_visible(&spec.presentation_layer(Rendition::Municipality)));

        coordinator.toggle_value(Level::Barangay, "Alpha", false, 20.0);
        coordinator.refresh(&mut map, 20.0);
        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::FilteredByMunicipality
        );
    }

    #[test]
    fn empty_barangay_warns_once_per_pass() {
        let (mut coordinator, mut map) = ready();
        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());
        coordinator.on_domain_toggle(&mut map, DomainKind::Households, true);

        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.toggle_value(Level::Barangay, "Beta", true, 0.0);
        coordinator.refresh(&mut map, 0.0);

        assert!(coordinator.domain(DomainKind::Households).is_active());
        assert_eq!(coordinator.domain(DomainKind::Households).filtered_count(), 0);
        assert_eq!(map.notices.len(), 1);
    }

    #[test]
    fn deferred_activation_runs_on_ready_event() {
        let (mut coordinator, mut map) = ready();

        let state = coordinator.on_domain_toggle(&mut map, DomainKind::Households, true);
        assert_eq!(state, DomainState::Inactive);
        assert!(map.is_visible(layer_ids::BOUNDARIES));

        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());

        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::ActiveUnfiltered
        );
        assert!(!map.is_visible(layer_ids::BOUNDARIES));
    }

    #[test]
    fn boundary_layer_returns_when_last_domain_deactivates() {
        let (mut coordinator, mut map) = ready();
        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());
        coordinator.on_domain_ready(&mut map, DomainKind::Schools, FeatureCollection::default());
        coordinator.on_domain_toggle(&mut map, DomainKind::Households, true);
        coordinator.on_domain_toggle(&mut map, DomainKind::Schools, true);

        coordinator.on_domain_toggle(&mut map, DomainKind::Households, false);
        assert!(!map.is_visible(layer_ids::BOUNDARIES));

        coordinator.on_domain_toggle(&mut map, DomainKind::Schools, false);
        assert!(map.is_visible(layer_ids::BOUNDARIES));
        assert!(map.is_visible(layer_ids::HOUSEHOLDS));
    }

    #[test]
    fn flood_extent_unlocks_with_a_barangay() {
        let (mut coordinator, mut map) = ready();
        assert!(!coordinator.select_flood_extent(&mut map, Some(25)));

        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.toggle_value(Level::Barangay, "Beta", true, 0.0);
        coordinator.refresh(&mut map, 0.0);
        assert!(coordinator.select_flood_extent(&mut map, Some(25)));
        assert_eq!(coordinator.flood_extent().selected(), Some(25));

        coordinator.clear_level(Level::Barangay, 10.0);
        coordinator.refresh(&mut map, 10.0);
        assert_eq!(coordinator.flood_extent().selected(), None);
        assert!(!map.is_visible("lyr_25_32"));
    }

    #[test]
    fn household_summary_covers_selected_barangays() {
        let (mut coordinator, mut map) = ready();
        assert_eq!(coordinator.household_summary(), None);
        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());

        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.toggle_value(Level::Barangay, "Alpha", true, 0.0);

        let summary = coordinator.household_summary().expect("summary");
        let totals = summary.totals();
        assert_eq!(totals.households, 3);
        assert_eq!(totals.population(), 8.0);
    }

    #[test]
    fn reloading_boundaries_clears_derived_map_state() {
        let (mut coordinator, mut map) = ready();
        coordinator.on_domain_ready(&mut map, DomainKind::Households, households());
        coordinator.on_domain_toggle(&mut map, DomainKind::Households, true);
        select_down_to(&mut coordinator, "Mun1", 0.0);
        coordinator.toggle_value(Level::Barangay, "Alpha", true, 0.0);
        coordinator.refresh(&mut map, 0.0);
        assert_eq!(map.feature_count(layer_ids::HIGHLIGHT), 1);
        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::FilteredByBarangay
        );

        coordinator.on_boundaries_ready(&boundary_collection(), 100.0);
        assert!(coordinator.selections().is_empty());
        assert!(coordinator.has_pending_refresh());

        assert!(coordinator.poll(&mut map, 10_000.0));
        assert_eq!(map.feature_count(layer_ids::HIGHLIGHT), 0);
        assert_eq!(coordinator.last_highlight(), Some(HighlightOutcome::Cleared));
        assert_eq!(
            coordinator.domain_state(DomainKind::Households),
            DomainState::ActiveUnfiltered
        );
        let spec = coordinator.domain(DomainKind::Households).spec().clone();
        assert_eq!(
            map.feature_count(&spec.presentation_layer(Rendition::Barangay)),
            0
        );
    }

    #[test]
    fn initial_view_uses_configured_scale() {
        let (coordinator, _) = ready();
        let view = coordinator.initial_view().expect("boundaries have geometry");
        assert!((view.resolution - View::resolution_for_scale(INITIAL_SCALE)).abs() < 1e-9);
        assert!(view.center_x > 13_600_000.0 && view.center_x < 13_800_000.0);
    }
}
