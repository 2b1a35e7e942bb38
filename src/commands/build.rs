use anyhow::Result;

use crate::census::{CensusApiClient, FetchStatus};
use crate::cli::{BuildArgs, Cli};
use crate::pipeline::build;

use super::Run;

pub fn run(cli: &Cli, args: &BuildArgs) -> Result<()> {
    let Run { settings, config, paths, mut options } = Run::resolve(cli, &args.district)?;
    options.election_year = args.election_year;
    options.results = args.results.clone();

    let api_key = args.api_key.clone().or(settings.census_api_key);
    let client = CensusApiClient::new(api_key)?;

    let title = config.title.clone();
    let summary = build(&paths, config, &client, &options)?;

    println!("{title}: {} block groups, {} precincts", summary.block_groups, summary.precincts);
    for (category, status) in &summary.categories {
        let status = match status {
            FetchStatus::Cached => "cached",
            FetchStatus::Fetched => "fetched",
        };
        println!("  {category:<10} {status}");
    }
    if args.results.is_some() {
        println!("  election   {} precincts", summary.election_precincts);
    }
    println!("Wrote {}", paths.root.display());
    Ok(())
}
