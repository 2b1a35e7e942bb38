use std::{collections::BTreeSet, path::{Path, PathBuf}, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Centroid, MultiPolygon};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    census::{block_groups_url, district_url, GEOID_FIELD},
    common::{download_big_file, extract_zip},
    config::{DistrictConfig, RunPaths},
    error::StatError,
    geom::{read_geojson_features, read_shapefile_features, write_geojson_features, Feature, Geometries, SOURCE_EPSG},
    resolve::MembershipResolver,
    units::{GeoId, GeoLevel, GeoUnit},
};

use super::BuildOptions;

/// The district boundary and the units resolved inside it, all in EPSG:4326.
#[derive(Debug, Clone)]
pub struct DistrictGeometry {
    pub district: GeoUnit,
    pub block_groups: Vec<GeoUnit>,
    pub precincts: Vec<GeoUnit>,
}

impl DistrictGeometry {
    /// Load (or download) every boundary a run needs, resolve membership, write
    /// the GeoJSON files and record the district centroid in `config`.
    pub fn prepare(paths: &RunPaths, config: &mut DistrictConfig, options: &BuildOptions) -> Result<Self> {
        let resolver = MembershipResolver::new(options.min_share);
        let geoid = config.geoid();

        let shape = load_district(paths, config, options.year)?;
        config.centroid = shape.centroid().map(|c| [c.x(), c.y()]);
        let district = GeoUnit::new(GeoId::district(&geoid), shape);

        // Block groups
        let candidates = load_block_group_candidates(paths, config, options.year, &district.geometry)?;
        let units = to_units(&candidates, GeoLevel::BlockGroup, GEOID_FIELD)?;
        let boundary = resolver.resolve(district.id.clone(), Arc::clone(&district.geometry), &units);
        let block_groups = boundary.select(&units).into_iter().cloned().collect::<Vec<_>>();
        write_members(&paths.block_groups_geojson, &candidates, &units, &boundary.members)?;

        // Precincts
        let precincts = match precinct_source(paths, options) {
            Some(path) => {
                let id_property = options.precinct_id_property.as_str();
                let features = near(read_geojson_features(&path)?, &district.geometry);
                if path != paths.precinct_candidates {
                    write_geojson_features(&paths.precinct_candidates, &features)?;
                }
                let units = to_units(&features, GeoLevel::Precinct, id_property)
                    .with_context(|| format!("Reading precincts from {}", path.display()))?;
                let boundary = resolver.resolve(district.id.clone(), Arc::clone(&district.geometry), &units);
                write_members(&paths.precincts_geojson, &features, &units, &boundary.members)?;
                boundary.select(&units).into_iter().cloned().collect()
            }
            None => Vec::new(),
        };

        info!(
            district = %geoid,
            block_groups = block_groups.len(),
            precincts = precincts.len(),
            "resolved district geometry"
        );
        Ok(Self { district, block_groups, precincts })
    }
}

/// The district shape from its cached GeoJSON, or from the TIGER shapefile.
fn load_district(paths: &RunPaths, config: &DistrictConfig, year: u16) -> Result<MultiPolygon<f64>> {
    let geoid = config.geoid();

    if paths.district_geojson.exists() {
        let features = read_geojson_features(&paths.district_geojson)?;
        let found = features.into_iter()
            .find(|f| f.property_str(GEOID_FIELD).is_none_or(|id| id == geoid));
        return match found {
            Some(feature) => Ok(feature.geometry),
            None => Err(StatError::NoBoundary { geoid, path: paths.district_geojson.clone() }.into()),
        };
    }

    let url = district_url(year, &config.state_fips, config.body);
    let shp = fetch_shapefile(&url, &paths.downloads)?;
    let feature = read_shapefile_features(&shp)?
        .into_iter()
        .find(|f| f.property_str(GEOID_FIELD).as_deref() == Some(geoid.as_str()))
        .ok_or_else(|| StatError::NoBoundary { geoid: geoid.clone(), path: shp.clone() })?;

    let shape = Geometries::new(vec![feature.geometry], Some(SOURCE_EPSG))
        .to_reference()?
        .into_shapes()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Reprojection dropped the district shape"))?;

    let mut properties = Map::new();
    properties.insert(GEOID_FIELD.into(), Value::String(geoid));
    properties.insert("NAME".into(), Value::String(config.title.clone()));
    write_geojson_features(&paths.district_geojson, &[Feature { properties, geometry: shape.clone() }])?;
    Ok(shape)
}

/// Block groups near the district, from the per-year candidate cache or from
/// the state's TIGER shapefile. Membership is decided later, so a rerun with
/// another threshold still sees every candidate.
fn load_block_group_candidates(
    paths: &RunPaths,
    config: &DistrictConfig,
    year: u16,
    district: &MultiPolygon<f64>,
) -> Result<Vec<Feature>> {
    let cached = paths.block_group_candidates(year);
    if cached.exists() {
        return read_geojson_features(&cached);
    }

    let url = block_groups_url(year, &config.state_fips);
    let shp = fetch_shapefile(&url, &paths.downloads)?;
    let features = read_shapefile_features(&shp)?;

    let shapes = features.iter().map(|f| f.geometry.clone()).collect();
    let shapes = Geometries::new(shapes, Some(SOURCE_EPSG)).to_reference()?.into_shapes();

    let features = features.into_iter()
        .zip(shapes)
        .map(|(feature, geometry)| {
            let mut properties = Map::new();
            if let Some(id) = feature.property_str(GEOID_FIELD) {
                properties.insert(GEOID_FIELD.into(), Value::String(id));
            }
            Feature { properties, geometry }
        })
        .collect::<Vec<_>>();

    let candidates = near(features, district);
    debug!(path = %cached.display(), features = candidates.len(), "caching block group candidates");
    write_geojson_features(&cached, &candidates)?;
    Ok(candidates)
}

/// Precincts given on the command line win over those cached by an earlier run.
fn precinct_source(paths: &RunPaths, options: &BuildOptions) -> Option<PathBuf> {
    options.precincts.clone()
        .or_else(|| paths.precinct_candidates.exists().then(|| paths.precinct_candidates.clone()))
}

/// Features whose bounding box meets the bounding box of `target`.
fn near(features: Vec<Feature>, target: &MultiPolygon<f64>) -> Vec<Feature> {
    let geoms = Geometries::new(features.iter().map(|f| f.geometry.clone()).collect(), None);
    let keep = geoms.candidates(target).into_iter().collect::<BTreeSet<_>>();
    features.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, feature)| feature)
        .collect()
}

fn to_units(features: &[Feature], level: GeoLevel, id_property: &str) -> Result<Vec<GeoUnit>> {
    features.iter().enumerate()
        .map(|(i, feature)| match feature.property_str(id_property) {
            Some(id) => Ok(GeoUnit::new(GeoId::new(level, id), feature.geometry.clone())),
            None => bail!("{level} feature {i} has no {id_property:?} property"),
        })
        .collect()
}

/// Write the features whose unit was resolved as a member.
fn write_members(path: &Path, features: &[Feature], units: &[GeoUnit], members: &BTreeSet<GeoId>) -> Result<()> {
    let kept = features.iter()
        .zip(units)
        .filter(|(_, unit)| members.contains(&unit.id))
        .map(|(feature, _)| feature.clone())
        .collect::<Vec<_>>();
    debug!(path = %path.display(), features = kept.len(), "writing member boundaries");
    write_geojson_features(path, &kept)
}

/// Download and unpack a TIGER archive into `downloads` unless its shapefile is already there.
fn fetch_shapefile(url: &str, downloads: &Path) -> Result<PathBuf> {
    let name = url.rsplit('/').next().unwrap_or(url);
    let stem = name.trim_end_matches(".zip");
    let shp = downloads.join(format!("{stem}.shp"));
    if shp.exists() { return Ok(shp) }

    let zip = downloads.join(name);
    if !zip.exists() {
        info!(url, "downloading boundaries");
        download_big_file(url, &zip, false)?;
    }
    extract_zip(&zip, downloads, true)?;

    if !shp.exists() {
        bail!("{} did not contain {}", zip.display(), shp.display());
    }
    Ok(shp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn feature(key: &str, id: &str) -> Feature {
        let mut properties = Map::new();
        properties.insert(key.into(), Value::String(id.into()));
        let geometry = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]]);
        Feature { properties, geometry }
    }

    #[test]
    fn units_take_their_id_from_the_property() {
        let units = to_units(&[feature("PRECINCT", "0101")], GeoLevel::Precinct, "PRECINCT").unwrap();
        assert_eq!(units[0].id, GeoId::precinct("0101"));
        assert!(to_units(&[feature("OTHER", "1")], GeoLevel::Precinct, "PRECINCT").is_err());
    }

    #[test]
    fn only_features_near_the_target_are_kept() {
        let far = Feature {
            properties: Map::new(),
            geometry: MultiPolygon(vec![polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 6.0)]]),
        };
        let target = MultiPolygon(vec![polygon![(x: 0.5, y: 0.5), (x: 2.0, y: 0.5), (x: 2.0, y: 2.0), (x: 0.5, y: 2.0)]]);

        let kept = near(vec![feature("GEOID", "a"), far, feature("GEOID", "b")], &target);
        let ids = kept.iter().filter_map(|f| f.property_str("GEOID")).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn cached_shapefile_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tl_2015_48_bg.shp"), b"").unwrap();
        let shp = fetch_shapefile(&block_groups_url(2015, "48"), dir.path()).unwrap();
        assert_eq!(shp, dir.path().join("tl_2015_48_bg.shp"));
    }
}
