use std::{collections::{BTreeMap, BTreeSet}, fmt, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::common::{state_fips, state_info, write_json_atomic};

/// The legislative body a district belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LegislativeBody {
    /// U.S. House of Representatives
    Congress,
    /// State senate (upper chamber)
    Senate,
    /// State house (lower chamber)
    House,
}

impl LegislativeBody {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegislativeBody::Congress => "congress",
            LegislativeBody::Senate => "senate",
            LegislativeBody::House => "house",
        }
    }

    /// Width of the zero-padded district number in GEOIDs.
    pub fn district_width(&self) -> usize {
        match self {
            LegislativeBody::Congress => 2,
            LegislativeBody::Senate | LegislativeBody::House => 3,
        }
    }

    /// Geography name used by the census API `for=` clause.
    pub fn census_geography(&self) -> &'static str {
        match self {
            LegislativeBody::Congress => "congressional district",
            LegislativeBody::Senate => "state legislative district (upper chamber)",
            LegislativeBody::House => "state legislative district (lower chamber)",
        }
    }

    /// Whether district-level values are taken from the census directly.
    /// State legislative districts are synthesized from block groups instead.
    pub fn is_census_geography(&self) -> bool { matches!(self, LegislativeBody::Congress) }

    fn title(&self) -> &'static str {
        match self {
            LegislativeBody::Congress => "Congressional District",
            LegislativeBody::Senate => "State Senate District",
            LegislativeBody::House => "State House District",
        }
    }
}

impl fmt::Display for LegislativeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Persisted district metadata (`district-config.json`).
///
/// `fetched` lists every (year, category) pair whose census data is in the cache,
/// and nothing else. It is only updated after the cache file has been written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictConfig {
    pub state: String,      // postal code, e.g. "TX"
    pub state_fips: String, // e.g. "48"
    pub district: String,   // zero-padded, e.g. "07"
    pub body: LegislativeBody,
    pub title: String,
    #[serde(default)]
    pub centroid: Option<[f64; 2]>, // lon, lat
    #[serde(default)]
    pub fetched: BTreeMap<u16, BTreeSet<String>>,
    #[serde(default)]
    pub files: BTreeMap<String, PathBuf>,
}

impl DistrictConfig {
    /// A fresh config for a district that has never been fetched.
    pub fn new(state: &str, district: &str, body: LegislativeBody) -> Result<Self> {
        let state = state.to_ascii_uppercase();
        let fips = state_fips(&state)?;
        let name = state_info(&state).map(|(_, name)| name).unwrap_or_default();
        let district = format!("{:0>width$}", district.trim(), width = body.district_width());

        Ok(Self {
            title: format!("{name} {} {}", body.title(), district.trim_start_matches('0')),
            state,
            state_fips: fips.to_string(),
            district,
            body,
            centroid: None,
            fetched: BTreeMap::new(),
            files: BTreeMap::new(),
        })
    }

    /// District GEOID: state FIPS followed by the padded district number.
    pub fn geoid(&self) -> String { format!("{}{}", self.state_fips, self.district) }

    pub fn is_fetched(&self, year: u16, category: &str) -> bool {
        self.fetched.get(&year).is_some_and(|set| set.contains(category))
    }

    pub fn mark_fetched(&mut self, year: u16, category: &str) {
        self.fetched.entry(year).or_default().insert(category.to_string());
    }

    pub fn unmark_fetched(&mut self, year: u16, category: &str) {
        if let Some(set) = self.fetched.get_mut(&year) {
            set.remove(category);
            if set.is_empty() { self.fetched.remove(&year); }
        }
    }

    /// Read the config at `path`, or None if there is no file yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() { return Ok(None) }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> Result<()> { write_json_atomic(path, self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pads_district_and_resolves_fips() {
        let config = DistrictConfig::new("tx", "7", LegislativeBody::Congress).unwrap();
        assert_eq!(config.state, "TX");
        assert_eq!(config.geoid(), "4807");
        assert_eq!(config.title, "Texas Congressional District 7");

        let senate = DistrictConfig::new("TX", "13", LegislativeBody::Senate).unwrap();
        assert_eq!(senate.geoid(), "48013");
    }

    #[test]
    fn unknown_state_is_an_error() {
        assert!(DistrictConfig::new("ZZ", "1", LegislativeBody::Congress).is_err());
    }

    #[test]
    fn fetched_pairs_are_tracked_per_year() {
        let mut config = DistrictConfig::new("TX", "07", LegislativeBody::Congress).unwrap();
        config.mark_fetched(2015, "age");
        assert!(config.is_fetched(2015, "age"));
        assert!(!config.is_fetched(2016, "age"));

        config.unmark_fetched(2015, "age");
        assert!(config.fetched.is_empty());
    }
}
