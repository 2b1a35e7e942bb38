mod geojson;
mod shp;

use geo::MultiPolygon;
use serde_json::{Map, Value};

pub use geojson::{read_geojson_features, write_geojson_features};
pub use shp::read_shapefile_features;

/// One areal feature: its attribute properties plus its geometry.
#[derive(Debug, Clone)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

impl Feature {
    /// Read a property as an identifier string. Numbers are rendered without quotes.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
