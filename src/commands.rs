pub mod build;
pub mod download;

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::cli::{Cli, DistrictArgs};
use crate::config::{DistrictConfig, RunPaths, Settings};
use crate::pipeline::BuildOptions;

/// Output root used when neither the command line nor the settings name one.
const DEFAULT_OUTPUT_DIR: &str = "districts";

/// Everything a command needs to know about its district, resolved once.
pub(crate) struct Run {
    pub settings: Settings,
    pub config: DistrictConfig,
    pub paths: RunPaths,
    pub options: BuildOptions,
}

impl Run {
    /// Merge command-line flags over the settings file.
    pub(crate) fn resolve(cli: &Cli, args: &DistrictArgs) -> Result<Self> {
        let settings = Settings::load(args.settings.as_deref())?;
        let config = DistrictConfig::new(&args.state, &args.district, args.body)?;

        let out = args.out.clone()
            .or_else(|| settings.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let paths = RunPaths::new(&out, &config);

        let mut options = BuildOptions::new(args.year);
        options.precincts = args.precincts.clone();
        options.min_share = args.min_share.unwrap_or_else(|| settings.min_overlap_share());
        options.precinct_id_property = settings.precinct_id_property().to_string();
        options.show_progress = cli.verbose > 0;

        debug!(district = %config.geoid(), root = %paths.root.display(), min_share = options.min_share, "resolved run");
        Ok(Self { settings, config, paths, options })
    }
}
