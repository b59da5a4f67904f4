use anyhow::{Context, Result, bail};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::{Map, Value};

use crate::level::Level;

/// Property keys holding the region name. The first spelling wins; the second one shows up in
/// older boundary exports.
pub const REGION_KEYS: [&str; 2] = ["Reg_Nme", "Reg_Name"];
pub const PROVINCE_KEY: &str = "Pro_Name";
pub const MUNICIPALITY_KEY: &str = "Mun_Name";
pub const BARANGAY_KEY: &str = "Bgy_Name";

/// One geometry + attribute record, as loaded from a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry<f64>>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>) -> Self {
        Self {
            properties: Map::new(),
            geometry,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    /// String property, treating blank strings as absent.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Numeric property. Numbers and numeric strings parse; anything else counts as zero.
    pub fn property_f64(&self, key: &str) -> f64 {
        let value = match self.properties.get(key) {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|value| value.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn from_geojson_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).context("failed to parse GeoJSON bytes")?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self> {
        let Some(features) = value.get("features").and_then(Value::as_array) else {
            bail!("invalid GeoJSON: expected a FeatureCollection with a features array");
        };

        let features = features
            .iter()
            .enumerate()
            .map(|(idx, feature)| {
                parse_feature(feature).with_context(|| format!("invalid GeoJSON feature #{idx}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

/// Anything that exposes a value per administrative level.
pub trait LevelAttributes {
    fn level_value(&self, level: Level) -> Option<&str>;
}

/// A boundary polygon tagged with its place in the administrative hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryFeature {
    pub region: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub barangay: Option<String>,
    pub geometry: Option<Geometry<f64>>,
}

impl BoundaryFeature {
    pub fn new(region: &str, province: &str, municipality: &str, barangay: &str) -> Self {
        let non_blank = |value: &str| (!value.trim().is_empty()).then(|| value.to_owned());
        Self {
            region: non_blank(region),
            province: non_blank(province),
            municipality: non_blank(municipality),
            barangay: non_blank(barangay),
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry<f64>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn from_feature(feature: &Feature) -> Self {
        let owned = |key: &str| feature.property_str(key).map(str::to_owned);
        Self {
            region: REGION_KEYS.iter().find_map(|key| owned(key)),
            province: owned(PROVINCE_KEY),
            municipality: owned(MUNICIPALITY_KEY),
            barangay: owned(BARANGAY_KEY),
            geometry: feature.geometry.clone(),
        }
    }
}

impl LevelAttributes for BoundaryFeature {
    fn level_value(&self, level: Level) -> Option<&str> {
        match level {
            Level::Region => self.region.as_deref(),
            Level::Province => self.province.as_deref(),
            Level::Municipality => self.municipality.as_deref(),
            Level::Barangay => self.barangay.as_deref(),
        }
    }
}

impl From<&BoundaryFeature> for Feature {
    fn from(boundary: &BoundaryFeature) -> Self {
        let mut feature = Feature::new(boundary.geometry.clone());
        let keys = [REGION_KEYS[0], PROVINCE_KEY, MUNICIPALITY_KEY, BARANGAY_KEY];
        for (level, key) in Level::ALL.into_iter().zip(keys) {
            if let Some(value) = boundary.level_value(level) {
                feature = feature.with_property(key, value);
            }
        }
        feature
    }
}

/// Which property key carries each level's value in a domain dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeKeys {
    keys: [Option<String>; 4],
}

impl AttributeKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, level: Level, key: &str) -> Self {
        self.keys[level.index()] = Some(key.to_owned());
        self
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        self.keys[level.index()].as_deref()
    }
}

/// Borrowed view of a domain feature through its dataset's attribute keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyedFeature<'a> {
    pub feature: &'a Feature,
    pub keys: &'a AttributeKeys,
}

impl LevelAttributes for KeyedFeature<'_> {
    fn level_value(&self, level: Level) -> Option<&str> {
        self.keys
            .get(level)
            .and_then(|key| self.feature.property_str(key))
    }
}

fn parse_feature(value: &Value) -> Result<Feature> {
    let properties = match value.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => bail!("feature properties must be an object"),
    };

    let geometry = match value.get("geometry") {
        Some(Value::Null) | None => None,
        Some(geometry) => Some(parse_geometry(geometry)?),
    };

    Ok(Feature {
        properties,
        geometry,
    })
}

pub(crate) fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .context("geometry is missing its type")?;

    if kind == "GeometryCollection" {
        let members = value
            .get("geometries")
            .and_then(Value::as_array)
            .context("GeometryCollection is missing geometries")?;
        let members = members
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Geometry::GeometryCollection(GeometryCollection(members)));
    }

    let coords = value
        .get("coordinates")
        .with_context(|| format!("{kind} geometry is missing coordinates"))?;

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(parse_position(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            parse_positions(coords)?
                .into_iter()
                .map(Point::from)
                .collect(),
        )),
        "LineString" => Geometry::LineString(LineString::new(parse_positions(coords)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            as_array(coords)?
                .iter()
                .map(|line| parse_positions(line).map(LineString::new))
                .collect::<Result<Vec<_>>>()?,
        )),
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            as_array(coords)?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => bail!("unsupported geometry type {other}"),
    };

    Ok(geometry)
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().context("coordinates must be an array")
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let ordinates = as_array(value)?;
    let x = ordinates.first().and_then(Value::as_f64);
    let y = ordinates.get(1).and_then(Value::as_f64);
    let (Some(x), Some(y)) = (x, y) else {
        bail!("position needs two numeric ordinates");
    };
    Ok(Coord { x, y })
}

fn parse_positions(value: &Value) -> Result<Vec<Coord<f64>>> {
    as_array(value)?.iter().map(parse_position).collect()
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = as_array(value)?
        .iter()
        .map(|ring| parse_positions(ring).map(LineString::new));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(Vec::new()),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}
