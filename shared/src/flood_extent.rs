use tracing::{debug, warn};

use crate::map_view::MapView;

/// Flood depth scenarios (metres) and the raster layer each one is exported as.
pub const FLOOD_EXTENT_LAYERS: [(u8, &str); 7] = [
    (24, "lyr_24_33"),
    (25, "lyr_25_32"),
    (26, "lyr_26_31"),
    (27, "lyr_27_30"),
    (28, "lyr_28_29"),
    (29, "lyr_29_28"),
    (30, "lyr_30_27"),
];

pub const FLOOD_EXTENT_OPACITY: f64 = 0.5;
pub const FLOOD_EXTENT_Z_INDEX: i32 = 10;

pub fn layer_for_depth(depth: u8) -> Option<&'static str> {
    FLOOD_EXTENT_LAYERS
        .iter()
        .find(|(value, _)| *value == depth)
        .map(|(_, layer)| *layer)
}

/// The flood depth picker. Only usable while at least one barangay is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloodExtentSelector {
    enabled: bool,
    selected: Option<u8>,
}

impl FloodExtentSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    /// Follow the barangay selection. Disabling resets the choice and hides every extent.
    pub fn set_enabled<M: MapView + ?Sized>(&mut self, map: &mut M, barangay_selected: bool) {
        if self.enabled == barangay_selected {
            return;
        }
        self.enabled = barangay_selected;
        if !barangay_selected {
            self.selected = None;
            hide_all(map);
        }
    }

    /// Show the extent for `depth`, or hide all of them for `None`.
    ///
    /// Returns false when the picker is disabled or the depth has no layer.
    pub fn select<M: MapView + ?Sized>(&mut self, map: &mut M, depth: Option<u8>) -> bool {
        if !self.enabled {
            warn!(?depth, "flood extent picker is disabled until a barangay is selected");
            return false;
        }

        hide_all(map);
        let Some(depth) = depth else {
            self.selected = None;
            return true;
        };
        let Some(layer) = layer_for_depth(depth) else {
            warn!(depth, "no flood extent layer for this depth");
            self.selected = None;
            return false;
        };

        if !map.has_layer(layer) {
            map.add_layer(layer, FLOOD_EXTENT_Z_INDEX);
        }
        map.set_opacity(layer, FLOOD_EXTENT_OPACITY);
        map.set_z_index(layer, FLOOD_EXTENT_Z_INDEX);
        map.set_visible(layer, true);
        self.selected = Some(depth);
        debug!(depth, layer, "flood extent shown");
        true
    }
}

fn hide_all<M: MapView + ?Sized>(map: &mut M) {
    for (_, layer) in FLOOD_EXTENT_LAYERS {
        map.set_visible(layer, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_view::testing::RecordingMap;

    fn map_with_extents() -> RecordingMap {
        FLOOD_EXTENT_LAYERS
            .iter()
            .fold(RecordingMap::sized(800.0, 600.0), |map, (_, layer)| {
                map.with_layer(layer)
            })
    }

    #[test]
    fn selection_requires_a_barangay() {
        let mut map = map_with_extents();
        let mut selector = FloodExtentSelector::new();

        assert!(!selector.select(&mut map, Some(26)));
        assert_eq!(selector.selected(), None);
    }

    #[test]
    fn showing_one_depth_hides_the_others() {
        let mut map = map_with_extents();
        let mut selector = FloodExtentSelector::new();
        selector.set_enabled(&mut map, true);

        assert!(selector.select(&mut map, Some(24)));
        assert!(selector.select(&mut map, Some(27)));

        assert!(!map.is_visible("lyr_24_33"));
        let shown = map.layer("lyr_27_30").expect("extent layer");
        assert!(shown.visible);
        assert_eq!(shown.opacity, FLOOD_EXTENT_OPACITY);
        assert_eq!(shown.z_index, FLOOD_EXTENT_Z_INDEX);
        assert_eq!(selector.selected(), Some(27));
    }

    #[test]
    fn disabling_resets_choice_and_hides_everything() {
        let mut map = map_with_extents();
        let mut selector = FloodExtentSelector::new();
        selector.set_enabled(&mut map, true);
        selector.select(&mut map, Some(30));

        selector.set_enabled(&mut map, false);

        assert_eq!(selector.selected(), None);
        assert!(!selector.is_enabled());
        assert!(FLOOD_EXTENT_LAYERS
            .iter()
            .all(|(_, layer)| !map.is_visible(layer)));
    }

    #[test]
    fn unknown_depth_is_rejected() {
        let mut map = map_with_extents();
        let mut selector = FloodExtentSelector::new();
        selector.set_enabled(&mut map, true);

        assert!(!selector.select(&mut map, Some(12)));
        assert_eq!(layer_for_depth(29), Some("lyr_29_28"));
    }
}
