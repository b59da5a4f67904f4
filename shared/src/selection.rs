use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::level::Level;

/// A set of chosen values at one level.
pub type SelectionSet = BTreeSet<String>;

/// Checked values per level plus the derived enable rules of the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    levels: [SelectionSet; 4],
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: Level) -> &SelectionSet {
        &self.levels[level.index()]
    }

    pub fn set<I, S>(&mut self, level: Level, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.levels[level.index()] = values
            .into_iter()
            .map(Into::into)
            .filter(|value: &String| !value.trim().is_empty())
            .collect();
    }

    /// Builder-style variant of [`Selections::set`].
    pub fn with<I, S>(mut self, level: Level, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(level, values);
        self
    }

    /// Check or uncheck a single value. Returns whether the set changed.
    pub fn toggle(&mut self, level: Level, value: &str, checked: bool) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let set = &mut self.levels[level.index()];
        if checked {
            set.insert(value.to_owned())
        } else {
            set.remove(value)
        }
    }

    pub fn clear(&mut self, level: Level) {
        self.levels[level.index()].clear();
    }

    /// Empty every level strictly below `level`.
    pub fn clear_below(&mut self, level: Level) {
        for descendant in level.descendants() {
            self.clear(descendant);
        }
    }

    pub fn clear_all(&mut self) {
        for level in Level::ALL {
            self.clear(level);
        }
    }

    /// Keep only the values at `level` that `allowed` accepts. Returns the number dropped.
    pub fn retain(&mut self, level: Level, mut allowed: impl FnMut(&str) -> bool) -> usize {
        let set = &mut self.levels[level.index()];
        let before = set.len();
        set.retain(|value| allowed(value));
        before - set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(BTreeSet::is_empty)
    }

    /// A level's control is enabled iff its parent has at least one selection.
    pub fn is_enabled(&self, level: Level) -> bool {
        match level.parent() {
            None => true,
            Some(parent) => !self.get(parent).is_empty(),
        }
    }

    /// Whether `value` passes the level's constraint (empty selection means unconstrained).
    pub fn admits(&self, level: Level, value: Option<&str>) -> bool {
        let set = self.get(level);
        set.is_empty() || value.is_some_and(|value| set.contains(value))
    }

    /// Dropdown label for a level, e.g. "Select Municipality" or "3 selected municipalities".
    pub fn summary_label(&self, level: Level) -> String {
        match self.get(level).len() {
            0 => format!("Select {}", level.title()),
            1 => format!("1 selected {}", level.name()),
            count => format!("{count} selected {}", level.plural()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_keeps_values_unique() {
        let mut selections = Selections::new();
        assert!(selections.toggle(Level::Province, "Albay", true));
        assert!(!selections.toggle(Level::Province, "Albay", true));
        assert!(!selections.toggle(Level::Province, "   ", true));
        assert_eq!(selections.get(Level::Province).len(), 1);

        assert!(selections.toggle(Level::Province, "Albay", false));
        assert!(selections.get(Level::Province).is_empty());
    }

    #[test]
    fn enable_rules_follow_parent_selection() {
        let mut selections = Selections::new();
        assert!(selections.is_enabled(Level::Region));
        assert!(!selections.is_enabled(Level::Province));

        selections.toggle(Level::Region, "Region V", true);
        assert!(selections.is_enabled(Level::Province));
        assert!(!selections.is_enabled(Level::Municipality));
    }

    #[test]
    fn clear_below_leaves_own_level_untouched() {
        let mut selections = Selections::new()
            .with(Level::Region, ["R"])
            .with(Level::Province, ["P"])
            .with(Level::Municipality, ["M"])
            .with(Level::Barangay, ["B"]);

        selections.clear_below(Level::Province);

        assert_eq!(selections.get(Level::Province).len(), 1);
        assert!(selections.get(Level::Municipality).is_empty());
        assert!(selections.get(Level::Barangay).is_empty());
    }

    #[test]
    fn summary_label_pluralizes() {
        let mut selections = Selections::new();
        assert_eq!(
            selections.summary_label(Level::Municipality),
            "Select Municipality"
        );

        selections.set(Level::Municipality, ["Daraga"]);
        assert_eq!(
            selections.summary_label(Level::Municipality),
            "1 selected municipality"
        );

        selections.set(Level::Municipality, ["Daraga", "Legazpi", "Tabaco"]);
        assert_eq!(
            selections.summary_label(Level::Municipality),
            "3 selected municipalities"
        );
        selections.set(Level::Barangay, ["A", "B"]);
        assert_eq!(selections.summary_label(Level::Barangay), "2 selected barangays");
    }
}
