use crate::feature::LevelAttributes;
use crate::level::Level;
use crate::selection::Selections;

/// Indices into the matched collection, in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedFeatureSet {
    indices: Vec<usize>,
}

impl MatchedFeatureSet {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolve the matched indices against the collection they were computed from.
    pub fn resolve<'a, F>(&'a self, features: &'a [F]) -> impl Iterator<Item = &'a F> + 'a {
        self.indices.iter().filter_map(|&idx| features.get(idx))
    }
}

/// Features whose value at every level is admitted by that level's selection.
///
/// An all-empty selection matches nothing: no selection means no highlight.
pub fn match_features<F: LevelAttributes>(
    features: &[F],
    selections: &Selections,
) -> MatchedFeatureSet {
    if selections.is_empty() {
        return MatchedFeatureSet::default();
    }

    let indices = features
        .iter()
        .enumerate()
        .filter(|(_, feature)| matches_feature(*feature, selections))
        .map(|(idx, _)| idx)
        .collect();

    MatchedFeatureSet { indices }
}

pub fn matches_feature<F: LevelAttributes + ?Sized>(feature: &F, selections: &Selections) -> bool {
    Level::ALL
        .into_iter()
        .all(|level| selections.admits(level, feature.level_value(level)))
}
