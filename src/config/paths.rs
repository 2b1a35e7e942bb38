use std::path::{Path, PathBuf};

use super::DistrictConfig;

/// Every file location of a run, derived once from the output root and district.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    /// Raw census values fetched so far; only ever grows.
    pub cache: PathBuf,
    /// Derived values of the last run; replaced on every run.
    pub data: PathBuf,
    pub categories: PathBuf,
    pub district_geojson: PathBuf,
    /// Member block groups of the last run.
    pub block_groups_geojson: PathBuf,
    /// Member precincts of the last run.
    pub precincts_geojson: PathBuf,
    /// Precincts near the district, whatever their overlap.
    pub precinct_candidates: PathBuf,
    pub sheets: PathBuf,
    pub downloads: PathBuf,
}

impl RunPaths {
    /// Lay out `<out>/<state>-<body>-<district>/...`.
    pub fn new(out: &Path, district: &DistrictConfig) -> Self {
        let root = out.join(format!(
            "{}-{}-{}",
            district.state.to_ascii_lowercase(),
            district.body.as_str(),
            district.district,
        ));
        let geojson = root.join("geojson");

        Self {
            config: root.join("district-config.json"),
            cache: root.join("census-cache.json"),
            data: root.join("district-data.json"),
            categories: root.join("categories.json"),
            district_geojson: geojson.join("district.geojson"),
            block_groups_geojson: geojson.join("blockgroups.geojson"),
            precincts_geojson: geojson.join("precincts.geojson"),
            precinct_candidates: geojson.join("precinct-candidates.geojson"),
            sheets: root.join("sheets"),
            downloads: root.join("downloads"),
            root,
        }
    }

    /// Block groups of the `year` TIGER release near the district, whatever their overlap.
    pub fn block_group_candidates(&self, year: u16) -> PathBuf {
        self.root.join("geojson").join(format!("blockgroup-candidates-{year}.geojson"))
    }

    /// The output files recorded in the district config.
    pub fn output_files(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("data", self.data.as_path()),
            ("categories", self.categories.as_path()),
            ("district_geojson", self.district_geojson.as_path()),
            ("blockgroups_geojson", self.block_groups_geojson.as_path()),
            ("sheets", self.sheets.as_path()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LegislativeBody;

    #[test]
    fn paths_are_rooted_in_district_directory() {
        let config = DistrictConfig::new("TX", "7", LegislativeBody::Congress).unwrap();
        let paths = RunPaths::new(Path::new("out"), &config);
        assert_eq!(paths.root, PathBuf::from("out/tx-congress-07"));
        assert_eq!(paths.config, PathBuf::from("out/tx-congress-07/district-config.json"));
        assert_ne!(paths.cache, paths.data);
        assert_eq!(paths.block_groups_geojson, PathBuf::from("out/tx-congress-07/geojson/blockgroups.geojson"));
        assert_eq!(
            paths.block_group_candidates(2015),
            PathBuf::from("out/tx-congress-07/geojson/blockgroup-candidates-2015.geojson"),
        );
    }
}
