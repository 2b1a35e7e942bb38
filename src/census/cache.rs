use std::{collections::BTreeMap, path::PathBuf};

use ahash::AHashMap;
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    config::{DistrictConfig, RunPaths},
    error::StatError,
    store::{RecordKey, RecordStore},
    units::{BlockGroupKey, FieldValues, GeoLevel},
};

use super::{Category, StatsClient};

/// One (year, category) pair to make available for a set of block groups.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub year: u16,
    pub category: &'a Category,
    pub block_groups: &'a [BlockGroupKey],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Already in the store; no query was issued.
    Cached,
    /// Queried, merged and persisted on this call.
    Fetched,
}

/// Persisted census values plus the district config that records what they cover.
///
/// The config lists a (year, category) pair only while the store holds its data:
/// the store is written first, the config second.
#[derive(Debug)]
pub struct CensusCache {
    store_path: PathBuf,
    config_path: PathBuf,
    store: RecordStore,
    config: DistrictConfig,
}

impl CensusCache {
    /// Open the cache of a run, starting from `seed` when no config was saved yet.
    pub fn open(paths: &RunPaths, seed: DistrictConfig) -> Result<Self> {
        let mut config = DistrictConfig::load(&paths.config)?.unwrap_or(seed);

        let store = match RecordStore::load(&paths.cache) {
            Ok(store) => store,
            Err(err) => {
                warn!(path = %paths.cache.display(), error = %err, "census data unreadable; starting empty");
                RecordStore::new()
            }
        };

        if store.is_empty() && !config.fetched.is_empty() {
            warn!(
                path = %paths.cache.display(),
                pairs = config.fetched.values().map(|set| set.len()).sum::<usize>(),
                "config lists fetched categories but no census data is stored; they will be refetched"
            );
            config.fetched.clear();
            config.save(&paths.config)?;
        }

        Ok(Self { store_path: paths.cache.clone(), config_path: paths.config.clone(), store, config })
    }

    #[inline] pub fn store(&self) -> &RecordStore { &self.store }

    #[inline] pub fn config(&self) -> &DistrictConfig { &self.config }

    #[inline] pub fn config_mut(&mut self) -> &mut DistrictConfig { &mut self.config }

    pub fn save_config(&self) -> Result<()> { self.config.save(&self.config_path) }

    /// Make the category's raw fields available for every requested block group
    /// (and for the district itself when the census reports it directly).
    /// Queries the client at most once per pair over the life of the cache files.
    pub fn ensure(&mut self, client: &dyn StatsClient, req: &FetchRequest<'_>) -> Result<FetchStatus> {
        let name = req.category.name;
        let fields = req.category.fields();

        if self.config.is_fetched(req.year, name) {
            if self.covers(req, &fields) {
                debug!(year = req.year, category = name, "census data cached");
                return Ok(FetchStatus::Cached);
            }
            warn!(year = req.year, category = name, "cached census data is incomplete; refetching");
            self.config.unmark_fetched(req.year, name);
        }

        info!(year = req.year, category = name, block_groups = req.block_groups.len(), "fetching census data");
        let mut fetched = RecordStore::new();

        let mut by_county: BTreeMap<&str, Vec<&BlockGroupKey>> = BTreeMap::new();
        for key in req.block_groups {
            by_county.entry(key.county.as_str()).or_default().push(key);
        }

        for (county, keys) in by_county {
            let rows = client.block_groups(req.year, &fields, &self.config.state_fips, county)?;
            debug!(county, rows = rows.len(), wanted = keys.len(), "county batch");

            // Rows come back in no particular order.
            let index: AHashMap<(&str, &str), &FieldValues> = rows.iter()
                .map(|row| ((row.tract.as_str(), row.block_group.as_str()), &row.values))
                .collect();

            for key in keys {
                let values = index.get(&(key.tract.as_str(), key.block_group.as_str()))
                    .ok_or_else(|| StatError::UnmatchedBlockGroup {
                        geoid: key.geoid(),
                        county: county.to_string(),
                        tract: key.tract.clone(),
                        block_group: key.block_group.clone(),
                    })?;
                fetched.merge(RecordKey::new(req.year, GeoLevel::BlockGroup, key.geoid()), (*values).clone());
            }
        }

        let body = self.config.body;
        if body.is_census_geography() {
            let values = client.district(req.year, &fields, &self.config.state_fips, body, &self.config.district)?;
            fetched.merge(self.district_key(req.year), values);
        }

        self.store.merge_all(fetched);
        self.store.save(&self.store_path)?;

        self.config.mark_fetched(req.year, name);
        self.save_config()?;
        Ok(FetchStatus::Fetched)
    }

    fn district_key(&self, year: u16) -> RecordKey {
        RecordKey::new(year, GeoLevel::District, self.config.geoid())
    }

    /// Whether the store carries `fields` for every unit the request needs.
    fn covers(&self, req: &FetchRequest<'_>, fields: &[&str]) -> bool {
        let block_groups = req.block_groups.iter().all(|key| {
            self.store.has_fields(&RecordKey::new(req.year, GeoLevel::BlockGroup, key.geoid()), fields)
        });
        let district = !self.config.body.is_census_geography()
            || self.store.has_fields(&self.district_key(req.year), fields);
        block_groups && district
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LegislativeBody;

    #[test]
    fn open_without_files_uses_seed() {
        let dir = tempfile::tempdir().unwrap();
        let seed = DistrictConfig::new("TX", "7", LegislativeBody::Congress).unwrap();
        let paths = RunPaths::new(dir.path(), &seed);

        let cache = CensusCache::open(&paths, seed.clone()).unwrap();
        assert_eq!(cache.config(), &seed);
        assert!(cache.store().is_empty());
    }

    #[test]
    fn open_drops_fetched_pairs_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut seed = DistrictConfig::new("TX", "7", LegislativeBody::Congress).unwrap();
        let paths = RunPaths::new(dir.path(), &seed);
        seed.mark_fetched(2015, "age");
        seed.save(&paths.config).unwrap();

        let cache = CensusCache::open(&paths, seed).unwrap();
        assert!(!cache.config().is_fetched(2015, "age"));

        let saved = DistrictConfig::load(&paths.config).unwrap().unwrap();
        assert!(saved.fetched.is_empty());
    }
}
