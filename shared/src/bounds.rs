use geo::{BoundingRect, Coord, Geometry, Rect};
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Axis-aligned bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Self::new(min.x, min.y, max.x, max.y)
    }

    pub fn of_geometry(geometry: &Geometry<f64>) -> Option<Self> {
        geometry.bounding_rect().map(Self::from_rect)
    }

    /// Union of the extents of every geometry; `None` when none has coordinates.
    pub fn union_of<'a, I>(geometries: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Geometry<f64>>,
    {
        geometries
            .into_iter()
            .filter_map(Self::of_geometry)
            .reduce(|mut acc, extent| {
                acc.extend(&extent);
                acc
            })
    }

    pub fn extend(&mut self, other: &Extent) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// How dataset coordinates map onto the view's coordinate system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Datasets carry lon/lat degrees; the view runs in spherical Web Mercator metres.
    #[default]
    LonLatToWebMercator,
    /// Datasets are already in view units.
    Identity,
}

impl Projection {
    pub fn project(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Identity => coord,
            Projection::LonLatToWebMercator => {
                let lat = coord.y.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
                Coord {
                    x: EARTH_RADIUS_M * coord.x.to_radians(),
                    y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
                }
            }
        }
    }

    /// Both supported projections are monotonic per axis, so projecting the corners suffices.
    pub fn project_extent(self, extent: &Extent) -> Extent {
        let min = self.project(Coord {
            x: extent.min_x,
            y: extent.min_y,
        });
        let max = self.project(Coord {
            x: extent.max_x,
            y: extent.max_y,
        });
        Extent::new(min.x, min.y, max.x, max.y)
    }
}
