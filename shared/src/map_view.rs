use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::viewport::{View, ViewAnimation};

/// Layer identifiers used by the exported dashboard project.
pub mod layer_ids {
    pub const BOUNDARIES: &str = "lyr_BarangayBoundaries_25";
    pub const HOUSEHOLDS: &str = "lyr_Households_26";
    pub const SCHOOLS: &str = "lyr_Schools_24";
    pub const MUNICIPALITY_AGGREGATES: &str = "lyr_MunicipalityAggregates_22";
    pub const HIGHLIGHT: &str = "highlight";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A user-facing message raised by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// The map widget the coordinator drives.
///
/// Implementations wrap whatever renders the map; the coordinator only ever talks to layers by
/// id and never holds on to renderer objects.
pub trait MapView {
    fn has_layer(&self, id: &str) -> bool;

    /// Create an empty vector layer. Adding an existing id is a no-op.
    fn add_layer(&mut self, id: &str, z_index: i32);

    fn remove_layer(&mut self, id: &str);

    /// Swap the layer's features for `features`.
    fn replace_features(&mut self, id: &str, features: Vec<Feature>);

    fn set_visible(&mut self, id: &str, visible: bool);

    fn set_opacity(&mut self, id: &str, opacity: f64);

    fn set_z_index(&mut self, id: &str, z_index: i32);

    /// Canvas size in pixels, `None` before the map is laid out.
    fn size(&self) -> Option<(f64, f64)>;

    fn current_view(&self) -> Option<View>;

    /// Start a view transition. A new animation replaces one still in flight.
    fn animate_view(&mut self, animation: ViewAnimation);

    fn notify(&mut self, notice: Notice);
}
