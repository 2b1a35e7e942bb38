use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// The three nested geography levels a district is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    BlockGroup, // Raw census reporting unit
    Precinct,   // Election administration unit
    District,   // Whole legislative district
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 3] = [GeoLevel::BlockGroup, GeoLevel::Precinct, GeoLevel::District];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeoLevel::BlockGroup => "blockgroup",
            GeoLevel::Precinct => "precinct",
            GeoLevel::District => "district",
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for GeoLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        GeoLevel::ALL.into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown geography level: {s}"))
    }
}
