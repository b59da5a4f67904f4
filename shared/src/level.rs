use serde::{Deserialize, Serialize};

/// Administrative level of the location cascade, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Region,
    Province,
    Municipality,
    Barangay,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Region,
        Level::Province,
        Level::Municipality,
        Level::Barangay,
    ];

    pub const fn index(self) -> usize {
        match self {
            Level::Region => 0,
            Level::Province => 1,
            Level::Municipality => 2,
            Level::Barangay => 3,
        }
    }

    pub const fn parent(self) -> Option<Level> {
        match self {
            Level::Region => None,
            Level::Province => Some(Level::Region),
            Level::Municipality => Some(Level::Province),
            Level::Barangay => Some(Level::Municipality),
        }
    }

    pub const fn child(self) -> Option<Level> {
        match self {
            Level::Region => Some(Level::Province),
            Level::Province => Some(Level::Municipality),
            Level::Municipality => Some(Level::Barangay),
            Level::Barangay => None,
        }
    }

    /// Levels strictly below `self`, nearest first.
    pub fn descendants(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().skip(self.index() + 1)
    }

    /// Levels strictly above `self`, coarsest first.
    pub fn ancestors(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().take(self.index())
    }

    pub const fn name(self) -> &'static str {
        match self {
            Level::Region => "region",
            Level::Province => "province",
            Level::Municipality => "municipality",
            Level::Barangay => "barangay",
        }
    }

    pub const fn plural(self) -> &'static str {
        match self {
            Level::Region => "regions",
            Level::Province => "provinces",
            Level::Municipality => "municipalities",
            Level::Barangay => "barangays",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Level::Region => "Region",
            Level::Province => "Province",
            Level::Municipality => "Municipality",
            Level::Barangay => "Barangay",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
