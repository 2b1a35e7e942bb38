use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::LegislativeBody;

/// District census statistics CLI
#[derive(Parser, Debug)]
#[command(name = "statdistricts", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch census data for a district and write its statistics
    Build(BuildArgs),

    /// Download and resolve district boundaries only
    Download(DistrictArgs),
}

/// Which district, and where its files go.
#[derive(Args, Debug)]
pub struct DistrictArgs {
    /// Two-letter postal code, e.g. TX, CA, PR
    pub state: String,

    /// District number, e.g. 7 or 07
    pub district: String,

    /// Legislative body the district belongs to
    #[arg(long, value_enum, default_value_t = LegislativeBody::Congress)]
    pub body: LegislativeBody,

    /// ACS 5-year census vintage (also picks the TIGER boundary vintage)
    #[arg(long, default_value_t = 2015)]
    pub year: u16,

    /// Precinct boundaries (GeoJSON, EPSG:4326)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub precincts: Option<PathBuf>,

    /// Output root; the district gets its own directory inside it
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    /// Minimum share of a unit's area inside a boundary to count as a member
    #[arg(long)]
    pub min_share: Option<f64>,

    /// Settings file (TOML); defaults to ./settings.toml when present
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub settings: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub district: DistrictArgs,

    /// Year the election results are filed under (defaults to --year)
    #[arg(long)]
    pub election_year: Option<u16>,

    /// Per-precinct election results (CSV keyed by the precinct id column)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub results: Option<PathBuf>,

    /// Census API key
    #[arg(long, env = "CENSUS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}
