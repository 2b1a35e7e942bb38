use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::resolve::DEFAULT_MIN_OVERLAP_SHARE;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

/// GeoJSON property (and results CSV column) holding the precinct number.
pub const DEFAULT_PRECINCT_ID_PROPERTY: &str = "PRECINCT";

/// User settings, read from a TOML file. Every key is optional.
///
/// ```toml
/// census_api_key = "..."
/// min_overlap_share = 0.10
/// precinct_id_property = "PRECINCT"
/// output_dir = "districts"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub census_api_key: Option<String>,
    pub min_overlap_share: Option<f64>,
    pub precinct_id_property: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`, or from `settings.toml` if it exists, or defaults.
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.exists() { return Ok(Self::default()) }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    #[inline]
    pub fn min_overlap_share(&self) -> f64 {
        self.min_overlap_share.unwrap_or(DEFAULT_MIN_OVERLAP_SHARE)
    }

    #[inline]
    pub fn precinct_id_property(&self) -> &str {
        self.precinct_id_property.as_deref().unwrap_or(DEFAULT_PRECINCT_ID_PROPERTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::parse("census_api_key = \"abc\"").unwrap();
        assert_eq!(settings.census_api_key.as_deref(), Some("abc"));
        assert_eq!(settings.min_overlap_share(), DEFAULT_MIN_OVERLAP_SHARE);
        assert_eq!(settings.precinct_id_property(), "PRECINCT");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("census_key = \"abc\"").is_err());
    }
}
