use std::{fs::File, io::BufReader, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

use super::Feature;
use crate::common::write_bytes_atomic;

/// Read all Polygon/MultiPolygon features of a GeoJSON FeatureCollection.
/// Features with other geometry types are skipped.
pub fn read_geojson_features(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))?;

    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("{} is not a FeatureCollection", path.display()))?;

    let mut out = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let geometry = &feature["geometry"];
        let coords = geometry["coordinates"].as_array();
        let shape = match (geometry["type"].as_str(), coords) {
            (Some("Polygon"), Some(rings)) => MultiPolygon(vec![parse_polygon(rings)?]),
            (Some("MultiPolygon"), Some(polygons)) => MultiPolygon(
                polygons.iter()
                    .map(|p| p.as_array()
                        .ok_or_else(|| anyhow!("Invalid MultiPolygon in feature {i}"))
                        .and_then(|rings| parse_polygon(rings)))
                    .collect::<Result<_>>()?
            ),
            _ => continue,
        };
        let properties = feature["properties"].as_object().cloned().unwrap_or_default();
        out.push(Feature { properties, geometry: shape });
    }
    Ok(out)
}

/// Write features as a GeoJSON FeatureCollection of MultiPolygons, replacing any existing file.
pub fn write_geojson_features(path: &Path, features: &[Feature]) -> Result<()> {
    let features = features.iter().map(|feature| {
        let polygons = feature.geometry.0.iter()
            .map(|polygon| std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
                .collect::<Vec<_>>())
            .collect::<Vec<_>>();

        json!({
            "type": "Feature",
            "geometry": { "type": "MultiPolygon", "coordinates": polygons },
            "properties": feature.properties,
        })
    }).collect::<Vec<_>>();

    let collection = json!({ "type": "FeatureCollection", "features": features });
    let bytes = serde_json::to_vec(&collection).context("Failed to serialize GeoJSON")?;
    write_bytes_atomic(path, &bytes)
}

/// Parse polygon rings: `[exterior, hole, hole, ...]`.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("Invalid polygon ring"))
            .and_then(|coords| parse_ring_coords(coords))
    });

    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => bail!("Invalid Polygon: missing exterior ring"),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring from `[[x, y], [x, y], ...]`, closing it if needed.
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = Vec::with_capacity(coords.len() + 1);

    for pair in coords {
        let pair = pair.as_array().filter(|p| p.len() >= 2)
            .ok_or_else(|| anyhow!("Invalid coordinate: expected [x, y]"))?;
        let x = pair[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
        let y = pair[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
        points.push(Coord { x, y });
    }

    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Ok(LineString(points))
}
