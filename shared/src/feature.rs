use serde_json::{Map, Value};

use crate::geo::Location;

/// Coordinates above these bounds are projected metres, not degrees.
const PROJECTED_SCALE: f64 = 100_000.0;

/// The attribute record of one clicked map feature, handed to whatever
/// builds the popup. The core never formats it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub layer_id: String,
    /// Where the popup anchors. `None` when the feature carries no usable
    /// position.
    pub anchor: Option<Location>,
    pub properties: Map<String, Value>,
}

impl FeatureRecord {
    /// Reads a GeoJSON feature as the map library reports it. Returns
    /// `None` when `feature` is not an object.
    pub fn from_feature(layer_id: &str, feature: &Value) -> Option<Self> {
        let feature = feature.as_object()?;
        let properties = match feature.get("properties") {
            Some(Value::Object(props)) => props.clone(),
            _ => Map::new(),
        };
        let anchor =
            property_anchor(&properties).or_else(|| geometry_anchor(feature.get("geometry")));
        if anchor.is_none() {
            tracing::debug!(layer_id, "feature has no usable position");
        }
        Some(Self {
            layer_id: layer_id.to_string(),
            anchor,
            properties,
        })
    }

    /// A property as display text. Strings come back unquoted, nulls and
    /// empty strings as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Inventory points carry their own latitude/longitude columns.
fn property_anchor(properties: &Map<String, Value>) -> Option<Location> {
    let lat = number(properties.get("latitude")?)?;
    let lng = number(properties.get("longitude")?)?;
    Location::new(lat, lng).ok()
}

fn geometry_anchor(geometry: Option<&Value>) -> Option<Location> {
    let geometry = geometry?.as_object()?;
    if geometry.get("type")?.as_str()? != "Point" {
        return None;
    }
    let coords = geometry.get("coordinates")?.as_array()?;
    let (mut lng, mut lat) = (number(coords.first()?)?, number(coords.get(1)?)?);
    if lng.abs() > 180.0 || lat.abs() > 90.0 {
        tracing::warn!(lng, lat, "projected coordinates, rescaling to degrees");
        lng /= PROJECTED_SCALE;
        lat /= PROJECTED_SCALE;
    }
    Location::new(lat, lng).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_properties_and_point_geometry() {
        let feature = json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [74.3441, 35.9078] },
            "properties": { "Name": "Attabad", "Category": "High", "Casualties": 19 },
        });
        let record = FeatureRecord::from_feature("AUG25_points", &feature).unwrap();
        assert_eq!(record.layer_id, "AUG25_points");
        assert_eq!(record.anchor, Some(Location::new(35.9078, 74.3441).unwrap()));
        assert_eq!(record.text("Name").as_deref(), Some("Attabad"));
        assert_eq!(record.text("Casualties").as_deref(), Some("19"));
        assert_eq!(record.text("Area"), None);
    }

    #[test]
    fn property_columns_win_over_geometry() {
        let feature = json!({
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
            "properties": { "latitude": "34.5", "longitude": "73.25", "district": "" },
        });
        let record = FeatureRecord::from_feature("landslide_points", &feature).unwrap();
        assert_eq!(record.anchor, Some(Location::new(34.5, 73.25).unwrap()));
        assert_eq!(record.text("district"), None);
    }

    #[test]
    fn projected_coordinates_are_rescaled() {
        let feature = json!({
            "geometry": { "type": "Point", "coordinates": [7_434_410.0, 3_590_780.0] },
            "properties": {},
        });
        let anchor = FeatureRecord::from_feature("AUG25_points", &feature)
            .unwrap()
            .anchor
            .unwrap();
        assert!((anchor.longitude() - 74.3441).abs() < 1e-9);
        assert!((anchor.latitude() - 35.9078).abs() < 1e-9);
    }

    #[test]
    fn polygon_without_columns_has_no_anchor() {
        let feature = json!({
            "geometry": { "type": "Polygon", "coordinates": [] },
            "properties": null,
        });
        let record = FeatureRecord::from_feature("hotspot_polygons", &feature).unwrap();
        assert!(record.anchor.is_none());
        assert!(record.properties.is_empty());
        assert!(FeatureRecord::from_feature("x", &json!([1, 2])).is_none());
    }
}
