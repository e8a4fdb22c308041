//! Context text generation for geospatial features.
//!
//! Builds the text that gets embedded for a feature: its name, an optional
//! H3 cell clause for points, then each scalar property as `key: value`.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::models::Feature;
use crate::domain::ports::SpatialCellIndexer;
use crate::services::template;

/// Separator between the parts of generated text.
const PART_SEPARATOR: &str = ". ";

/// Turns features into the text that gets embedded.
pub struct ContextGenerator {
    cell_indexer: Arc<dyn SpatialCellIndexer>,
    resolution: u8,
}

impl ContextGenerator {
    pub fn new(cell_indexer: Arc<dyn SpatialCellIndexer>, resolution: u8) -> Self {
        Self {
            cell_indexer,
            resolution,
        }
    }

    pub const fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Text representation of `feature`.
    ///
    /// A template that fails to render falls back to the default text. The
    /// result is never empty.
    pub fn generate_context(
        &self,
        feature: &Feature,
        template: Option<&str>,
        include_topology: bool,
    ) -> String {
        if let Some(template) = template {
            match template::render(template, &template_fields(feature)) {
                Ok(text) => return text,
                Err(e) => {
                    debug!(error = %e, template, "template rendering failed, using default context");
                }
            }
        }
        self.default_context(feature, include_topology)
    }

    fn default_context(&self, feature: &Feature, include_topology: bool) -> String {
        let mut parts = vec![feature.name()];

        if include_topology {
            if let Some(clause) = self.topology_clause(feature) {
                parts.push(clause);
            }
        }

        parts.extend(
            feature
                .scalar_properties()
                .map(|(key, value)| format!("{key}: {value}")),
        );

        parts.join(PART_SEPARATOR)
    }

    fn topology_clause(&self, feature: &Feature) -> Option<String> {
        let (lon, lat) = feature.geometry.as_ref()?.as_point()?;
        match self.cell_indexer.cell_id(lat, lon, self.resolution) {
            Ok(cell) => Some(format!("located at {lon:.4}, {lat:.4} in H3 cell {cell}")),
            Err(e) => {
                debug!(error = %e, lat, lon, "skipping topology clause");
                None
            }
        }
    }
}

/// Values visible to a template: `name`, `properties` and the geometry members.
fn template_fields(feature: &Feature) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::String(feature.name()));
    fields.insert(
        "properties".to_string(),
        Value::Object(feature.properties.clone()),
    );
    if let Some(geometry) = &feature.geometry {
        for (key, value) in geometry.fields() {
            fields.entry(key).or_insert(value);
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CellIndexError;
    use crate::domain::models::{Geometry, UNKNOWN_NAME};
    use serde_json::json;

    struct FixedCell;

    impl SpatialCellIndexer for FixedCell {
        fn cell_id(&self, lat: f64, lon: f64, _resolution: u8) -> Result<String, CellIndexError> {
            if lat.abs() > 90.0 {
                return Err(CellIndexError::InvalidCoordinates { lat, lon });
            }
            Ok("89283082803ffff".to_string())
        }
    }

    fn generator() -> ContextGenerator {
        ContextGenerator::new(Arc::new(FixedCell), 9)
    }

    fn feature(value: serde_json::Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_point_with_properties() {
        let f = feature(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-122.41941, 37.77493]},
            "properties": {"name": "Market Street", "kind": "road", "lanes": 4, "paved": true}
        }));
        let text = generator().generate_context(&f, None, true);
        assert_eq!(
            text,
            "Market Street. located at -122.4194, 37.7749 in H3 cell 89283082803ffff. \
             kind: road. lanes: 4. paved: true"
        );
    }

    #[test]
    fn test_topology_can_be_disabled() {
        let f = Feature::new(Some(Geometry::point(1.0, 2.0)), Map::new());
        assert_eq!(generator().generate_context(&f, None, false), UNKNOWN_NAME);
    }

    #[test]
    fn test_non_point_geometry_has_no_topology() {
        let f = feature(json!({
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]},
            "properties": {"name": "Trail"}
        }));
        assert_eq!(generator().generate_context(&f, None, true), "Trail");
    }

    #[test]
    fn test_invalid_coordinates_omit_topology() {
        let f = feature(json!({
            "geometry": {"type": "Point", "coordinates": [10.0, 123.0]},
            "properties": {"name": "Nowhere", "note": "bad lat"}
        }));
        assert_eq!(
            generator().generate_context(&f, None, true),
            "Nowhere. note: bad lat"
        );
    }

    #[test]
    fn test_template_is_used_when_valid() {
        let f = feature(json!({
            "geometry": {"type": "Point", "coordinates": [2.35, 48.85]},
            "properties": {"name": "Paris", "country": "France"}
        }));
        let text = generator().generate_context(
            &f,
            Some("{name}, {properties[country]} ({type})"),
            true,
        );
        assert_eq!(text, "Paris, France (Point)");
    }

    #[test]
    fn test_broken_template_falls_back() {
        let f = feature(json!({"properties": {"name": "Oslo"}}));
        let gen = generator();
        for template in ["{missing}", "{name", "{}", "", "{coordinates[0]}"] {
            assert_eq!(gen.generate_context(&f, Some(template), true), "Oslo");
        }
    }

    #[test]
    fn test_geometry_members_do_not_shadow_name() {
        let f = feature(json!({
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0], "name": "shadow"},
            "properties": {"name": "Null Island"}
        }));
        assert_eq!(
            generator().generate_context(&f, Some("{name}"), false),
            "Null Island"
        );
    }
}
