mod download;
mod fips;
mod fs;

pub(crate) use download::*;
pub(crate) use fips::*;
pub(crate) use fs::*;
