pub mod bounds;
pub mod cascade;
pub mod chat;
pub mod coordinator;
pub mod dataset;
pub mod domain_layer;
pub mod feature;
pub mod flood_extent;
pub mod highlight;
pub mod household;
pub mod level;
pub mod map_view;
pub mod matcher;
pub mod selection;
pub mod viewport;

pub use bounds::{Extent, Projection};
pub use cascade::{CascadeState, OptionList, derive_options};
pub use coordinator::{CascadeCoordinator, CoordinatorConfig};
pub use dataset::BoundaryDataset;
pub use domain_layer::{DomainKind, DomainLayer, DomainSpec, DomainState, Rendition};
pub use feature::{AttributeKeys, BoundaryFeature, Feature, FeatureCollection, LevelAttributes};
pub use flood_extent::FloodExtentSelector;
pub use highlight::{HighlightDriver, HighlightOutcome};
pub use household::HouseholdSummary;
pub use level::Level;
pub use map_view::{MapView, Notice, NoticeLevel};
pub use matcher::{MatchedFeatureSet, match_features};
pub use selection::{SelectionSet, Selections};
pub use viewport::{FitOptions, View, ViewAnimation};
