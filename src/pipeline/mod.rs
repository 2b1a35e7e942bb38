//! One district run: geometry, then per category fetch, classify, apportion
//! and assemble, then election results and the output documents.

mod geometry;

pub use geometry::DistrictGeometry;

use std::path::PathBuf;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    census::{CensusCache, FetchRequest, FetchStatus, StatsClient, CATEGORIES},
    common::{ensure_dir_exists, write_json_atomic},
    config::{DistrictConfig, RunPaths, DEFAULT_PRECINCT_ID_PROPERTY},
    output::{build_schema, write_sheets, Assembler, ElectionResults},
    resolve::DEFAULT_MIN_OVERLAP_SHARE,
    store::RecordStore,
    units::BlockGroupKey,
};

/// Parameters of a run beyond the district itself.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// ACS 5-year vintage.
    pub year: u16,
    /// Year the election results are filed under; defaults to `year`.
    pub election_year: Option<u16>,
    /// Precinct boundaries (GeoJSON, EPSG:4326).
    pub precincts: Option<PathBuf>,
    /// Per-precinct election results (CSV).
    pub results: Option<PathBuf>,
    pub min_share: f64,
    pub precinct_id_property: String,
    pub show_progress: bool,
}

impl BuildOptions {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            election_year: None,
            precincts: None,
            results: None,
            min_share: DEFAULT_MIN_OVERLAP_SHARE,
            precinct_id_property: DEFAULT_PRECINCT_ID_PROPERTY.to_string(),
            show_progress: false,
        }
    }

    #[inline]
    pub fn election_year(&self) -> u16 { self.election_year.unwrap_or(self.year) }
}

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub block_groups: usize,
    pub precincts: usize,
    pub categories: Vec<(&'static str, FetchStatus)>,
    pub election_precincts: usize,
    pub sheets: Vec<PathBuf>,
}

/// Run the whole pipeline for one district and write every output file.
///
/// Raw census values accumulate in the cache across runs; everything derived
/// from them is rebuilt here and replaces the previous run's outputs.
pub fn build(paths: &RunPaths, seed: DistrictConfig, client: &dyn StatsClient, options: &BuildOptions) -> Result<BuildSummary> {
    ensure_dir_exists(&paths.root)?;
    let mut cache = CensusCache::open(paths, seed)?;

    let geometry = DistrictGeometry::prepare(paths, cache.config_mut(), options)?;
    let keys = geometry.block_groups.iter()
        .map(|unit| BlockGroupKey::parse(unit.id.as_str()))
        .collect::<Result<Vec<_>>>()?;
    if keys.is_empty() {
        bail!("No block groups resolved inside district {}", geometry.district.id.as_str());
    }

    let census_district = cache.config().body.is_census_geography();
    let assembler = Assembler::new(
        options.year,
        &geometry.district,
        census_district,
        &geometry.block_groups,
        &geometry.precincts,
    );
    let progress = progress_bar(assembler.units_per_category() * CATEGORIES.len() as u64, options.show_progress)?;
    let assembler = assembler.with_progress(progress.clone());

    let mut outputs = RecordStore::new();
    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for category in CATEGORIES {
        progress.set_message(category.name);
        let request = FetchRequest { year: options.year, category, block_groups: &keys };
        let status = cache.ensure(client, &request)?;
        assembler.assemble(cache.store(), &mut outputs, category)?;
        categories.push((category.name, status));
    }
    progress.finish_and_clear();

    let mut election_columns = Vec::new();
    let mut election_precincts = 0;
    if let Some(path) = &options.results {
        if geometry.precincts.is_empty() {
            bail!("Election results {} need precinct boundaries", path.display());
        }
        let results = ElectionResults::read_csv(path, &options.precinct_id_property)?;
        election_precincts = results.attach(
            &mut outputs,
            options.election_year(),
            &geometry.precincts,
            geometry.district.id.as_str(),
        );
        if election_precincts < geometry.precincts.len() {
            warn!(
                missing = geometry.precincts.len() - election_precincts,
                "some precincts in the district have no election results"
            );
        }
        election_columns = results.columns().to_vec();
    }

    let schema = build_schema(&CATEGORIES, &election_columns);
    write_json_atomic(&paths.categories, &schema)?;
    outputs.save(&paths.data)?;
    let sheets = write_sheets(&outputs, &schema, options.year, options.election_year(), &paths.sheets)?;

    let config = cache.config_mut();
    for (name, path) in paths.output_files() {
        config.files.insert(name.to_string(), path.to_path_buf());
    }
    if !geometry.precincts.is_empty() {
        config.files.insert("precincts_geojson".to_string(), paths.precincts_geojson.clone());
    }
    cache.save_config()?;

    info!(
        root = %paths.root.display(),
        block_groups = geometry.block_groups.len(),
        precincts = geometry.precincts.len(),
        sheets = sheets.len(),
        "district statistics written"
    );

    Ok(BuildSummary {
        block_groups: geometry.block_groups.len(),
        precincts: geometry.precincts.len(),
        categories,
        election_precincts,
        sheets,
    })
}

fn progress_bar(len: u64, visible: bool) -> Result<ProgressBar> {
    if !visible { return Ok(ProgressBar::hidden()) }
    let bar = ProgressBar::new(len);
    bar.set_style(ProgressStyle::with_template("{msg:>10} [{bar:40}] {pos}/{len} units")?.progress_chars("=> "));
    Ok(bar)
}
