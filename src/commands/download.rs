use anyhow::Result;

use crate::cli::{Cli, DistrictArgs};
use crate::common::ensure_dir_exists;
use crate::config::DistrictConfig;
use crate::pipeline::DistrictGeometry;

use super::Run;

/// Prepare the district's boundaries without touching census data.
pub fn run(cli: &Cli, args: &DistrictArgs) -> Result<()> {
    let Run { config: seed, paths, options, .. } = Run::resolve(cli, args)?;
    ensure_dir_exists(&paths.root)?;

    let mut config = DistrictConfig::load(&paths.config)?.unwrap_or(seed);
    let geometry = DistrictGeometry::prepare(&paths, &mut config, &options)?;
    config.files.insert("district_geojson".into(), paths.district_geojson.clone());
    config.files.insert("blockgroups_geojson".into(), paths.block_groups_geojson.clone());
    if !geometry.precincts.is_empty() {
        config.files.insert("precincts_geojson".into(), paths.precincts_geojson.clone());
    }
    config.save(&paths.config)?;

    println!(
        "{}: {} block groups, {} precincts -> {}",
        config.title,
        geometry.block_groups.len(),
        geometry.precincts.len(),
        paths.root.display(),
    );
    Ok(())
}
