//! Geospatial feature models
//!
//! GeoJSON-shaped input accepted by the embedding pipeline. Properties keep
//! their insertion order (serde_json is built with `preserve_order`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Name used when a feature carries no usable `name` property.
pub const UNKNOWN_NAME: &str = "Unknown location";

/// Property key holding the feature's display label.
pub const NAME_PROPERTY: &str = "name";

/// A scalar property value usable in generated text.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(Number),
    Boolean(bool),
}

impl PropertyValue {
    /// Classify a JSON value; returns `None` for null, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// A GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Geometry type (`Point`, `LineString`, `Polygon`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Coordinate array; absent for `GeometryCollection`
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub coordinates: Value,

    /// Any other members (`geometries`, `bbox`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Geometry {
    /// Build a point geometry from longitude and latitude.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: serde_json::json!([lon, lat]),
            extra: Map::new(),
        }
    }

    /// Longitude and latitude when this is a point with numeric coordinates.
    pub fn as_point(&self) -> Option<(f64, f64)> {
        if self.kind != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some((lon, lat))
    }

    /// All members of the geometry as they appear in GeoJSON.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String(self.kind.clone()));
        if !self.coordinates.is_null() {
            fields.insert("coordinates".to_string(), self.coordinates.clone());
        }
        for (key, value) in &self.extra {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }

    /// Serialize to GeoJSON text.
    pub fn to_geojson(&self) -> String {
        Value::Object(self.fields()).to_string()
    }
}

/// A geospatial entity with optional shape and named attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,

    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl Feature {
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            geometry,
            properties,
        }
    }

    /// Display label: the scalar `name` property, or [`UNKNOWN_NAME`] when it
    /// is absent, non-scalar or blank.
    pub fn name(&self) -> String {
        self.properties
            .get(NAME_PROPERTY)
            .and_then(PropertyValue::from_json)
            .map(|v| v.to_string())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    /// Scalar properties other than `name`, in insertion order.
    pub fn scalar_properties(&self) -> impl Iterator<Item = (&str, PropertyValue)> {
        self.properties
            .iter()
            .filter(|(key, _)| key.as_str() != NAME_PROPERTY)
            .filter_map(|(key, value)| PropertyValue::from_json(value).map(|v| (key.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_name_defaults_to_sentinel() {
        let feature = Feature::new(None, Map::new());
        assert_eq!(feature.name(), UNKNOWN_NAME);

        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": null,
            "properties": {"name": ["not", "scalar"]}
        }))
        .unwrap();
        assert_eq!(feature.name(), UNKNOWN_NAME);
    }

    #[test]
    fn test_blank_name_uses_sentinel() {
        for blank in ["", "   ", "\t\n"] {
            let feature: Feature = serde_json::from_value(json!({
                "properties": {"name": blank}
            }))
            .unwrap();
            assert_eq!(feature.name(), UNKNOWN_NAME, "name {blank:?}");
        }
    }

    #[test]
    fn test_numeric_name_is_rendered() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {"name": 42}
        }))
        .unwrap();
        assert_eq!(feature.name(), "42");
    }

    #[test]
    fn test_scalar_properties_preserve_order_and_skip_non_scalars() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": null,
            "properties": {
                "zeta": "last-alphabetically",
                "name": "Somewhere",
                "tags": ["a", "b"],
                "alpha": 1.5,
                "capital": true,
                "missing": null
            }
        }))
        .unwrap();

        let keys: Vec<&str> = feature.scalar_properties().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "capital"]);
    }

    #[test]
    fn test_point_geometry() {
        let geometry = Geometry::point(-74.006, 40.7128);
        assert_eq!(geometry.as_point(), Some((-74.006, 40.7128)));

        let parsed: Geometry =
            serde_json::from_str(&geometry.to_geojson()).expect("round trip geojson");
        assert_eq!(parsed, geometry);
    }

    #[test]
    fn test_non_point_geometry_is_not_a_point() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "LineString",
            "coordinates": [[0.0, 0.0], [1.0, 1.0]]
        }))
        .unwrap();
        assert_eq!(geometry.as_point(), None);
        assert_eq!(geometry.fields().len(), 2);
    }

    #[test]
    fn test_geometry_collection_keeps_extra_members() {
        let value = json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "Point", "coordinates": [1.0, 2.0]}]
        });
        let geometry: Geometry = serde_json::from_value(value.clone()).unwrap();
        assert!(geometry.coordinates.is_null());
        assert_eq!(serde_json::to_value(&geometry).unwrap(), value);
    }
}
