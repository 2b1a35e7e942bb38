use std::{fmt, sync::Arc};

use anyhow::{bail, Result};

use super::GeoLevel;

/// Stable key for any unit across levels.
/// Keeps the original identifier text (with leading zeros) without repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeoId {
    pub level: GeoLevel,
    pub id: Arc<str>, // e.g. "482015420001" for a block group, "0101" for a precinct
}

impl GeoId {
    pub fn new(level: GeoLevel, id: impl AsRef<str>) -> Self {
        Self { level, id: Arc::from(id.as_ref()) }
    }

    #[inline] pub fn block_group(id: impl AsRef<str>) -> Self { Self::new(GeoLevel::BlockGroup, id) }

    #[inline] pub fn precinct(id: impl AsRef<str>) -> Self { Self::new(GeoLevel::Precinct, id) }

    #[inline] pub fn district(id: impl AsRef<str>) -> Self { Self::new(GeoLevel::District, id) }

    #[inline] pub fn as_str(&self) -> &str { &self.id }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.id)
    }
}

/// The pieces of a 12-character block-group GEOID, as the census API addresses them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockGroupKey {
    pub state: String,       // 2 digits
    pub county: String,      // 3 digits
    pub tract: String,       // 6 digits
    pub block_group: String, // 1 digit
}

impl BlockGroupKey {
    /// Split a block-group GEOID into state/county/tract/block-group prefixes.
    pub fn parse(geoid: &str) -> Result<Self> {
        if geoid.len() != 12 || !geoid.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Not a block group GEOID: {geoid:?}");
        }
        Ok(Self {
            state: geoid[..2].to_string(),
            county: geoid[2..5].to_string(),
            tract: geoid[5..11].to_string(),
            block_group: geoid[11..12].to_string(),
        })
    }

    /// Reassemble the full GEOID.
    pub fn geoid(&self) -> String {
        format!("{}{}{}{}", self.state, self.county, self.tract, self.block_group)
    }

    #[inline] pub fn geo_id(&self) -> GeoId { GeoId::block_group(self.geoid()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_group_key_splits_geoid() {
        let key = BlockGroupKey::parse("482015420001").unwrap();
        assert_eq!(key.state, "48");
        assert_eq!(key.county, "201");
        assert_eq!(key.tract, "542000");
        assert_eq!(key.block_group, "1");
        assert_eq!(key.geoid(), "482015420001");
    }

    #[test]
    fn block_group_key_rejects_other_levels() {
        assert!(BlockGroupKey::parse("48201").is_err());
        assert!(BlockGroupKey::parse("48201542000A").is_err());
    }

    #[test]
    fn geo_ids_order_by_level_then_id() {
        let a = GeoId::block_group("2");
        let b = GeoId::precinct("1");
        assert!(a < b);
        assert_eq!(b.to_string(), "precinct:1");
    }
}
