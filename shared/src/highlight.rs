use tracing::{debug, warn};

use crate::bounds::{Extent, Projection};
use crate::feature::{BoundaryFeature, Feature};
use crate::map_view::MapView;
use crate::viewport::{FitOptions, View, ViewAnimation, fit_extent};

pub const HIGHLIGHT_Z_INDEX: i32 = 1000;

/// What a highlight pass ended up doing to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HighlightOutcome {
    /// Nothing matched; the layer was cleared and the view left alone.
    Cleared,
    Fitted(View),
    /// Features matched but none had usable geometry.
    NoGeometry,
    /// The map has not reported a usable size yet.
    NoViewSize,
}

/// Mirrors the matched boundary features into a dedicated overlay and frames them.
#[derive(Debug, Clone)]
pub struct HighlightDriver {
    layer_id: String,
    z_index: i32,
    fit: FitOptions,
    projection: Projection,
}

impl HighlightDriver {
    pub fn new(layer_id: impl Into<String>, fit: FitOptions, projection: Projection) -> Self {
        Self {
            layer_id: layer_id.into(),
            z_index: HIGHLIGHT_Z_INDEX,
            fit,
            projection,
        }
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn apply<'a, M, I>(&self, map: &mut M, matched: I, now_ms: f64) -> HighlightOutcome
    where
        M: MapView + ?Sized,
        I: IntoIterator<Item = &'a BoundaryFeature>,
    {
        if !map.has_layer(&self.layer_id) {
            map.add_layer(&self.layer_id, self.z_index);
        }

        let clones: Vec<Feature> = matched.into_iter().map(Feature::from).collect();
        if clones.is_empty() {
            map.replace_features(&self.layer_id, Vec::new());
            return HighlightOutcome::Cleared;
        }

        let extent = Extent::union_of(clones.iter().filter_map(|f| f.geometry.as_ref()));
        let count = clones.len();
        map.replace_features(&self.layer_id, clones);

        let Some(extent) = extent else {
            warn!(count, "matched features carry no geometry; not fitting the view");
            return HighlightOutcome::NoGeometry;
        };
        let Some(size) = map.size() else {
            warn!("map has no size yet; skipping fit");
            return HighlightOutcome::NoViewSize;
        };

        let target_extent = self.projection.project_extent(&extent);
        let Some(target) = fit_extent(&target_extent, size, &self.fit) else {
            warn!(?size, "map is smaller than the fit padding; skipping fit");
            return HighlightOutcome::NoViewSize;
        };

        let from = map.current_view().unwrap_or(target);
        map.animate_view(ViewAnimation::new(from, target, now_ms, self.fit.duration_ms));
        debug!(count, zoom = target.zoom(), "highlight fitted");
        HighlightOutcome::Fitted(target)
    }
}
