use crate::config::LegislativeBody;

const TIGER_BASE: &str = "https://www2.census.gov/geo/tiger";

/// Block-group shapefile archive for one state.
/// Example: (2015, "48") -> ".../TIGER2015/BG/tl_2015_48_bg.zip"
pub(crate) fn block_groups_url(year: u16, fips: &str) -> String {
    format!("{TIGER_BASE}/TIGER{year}/BG/tl_{year}_{fips}_bg.zip")
}

/// District shapefile archive for a legislative body.
/// Congressional districts ship as one national file named after the Congress
/// in session; state legislative districts ship per state.
pub(crate) fn district_url(year: u16, fips: &str, body: LegislativeBody) -> String {
    match body {
        LegislativeBody::Congress => {
            let congress = congress_for_year(year);
            format!("{TIGER_BASE}/TIGER{year}/CD/tl_{year}_us_cd{congress}.zip")
        }
        LegislativeBody::Senate => format!("{TIGER_BASE}/TIGER{year}/SLDU/tl_{year}_{fips}_sldu.zip"),
        LegislativeBody::House => format!("{TIGER_BASE}/TIGER{year}/SLDL/tl_{year}_{fips}_sldl.zip"),
    }
}

/// Congress whose district lines TIGER publishes for a vintage year.
/// The 117th kept the 116th's lines, so no vintage carries 117.
fn congress_for_year(year: u16) -> u16 {
    match year {
        ..=2013 => 113,
        2014..=2015 => 114,
        2016..=2017 => 115,
        2018..=2021 => 116,
        2022..=2023 => 118,
        _ => 119,
    }
}

/// GEOID attribute of every TIGER boundary shapefile used here.
pub(crate) const GEOID_FIELD: &str = "GEOID";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_group_url_is_per_state() {
        assert_eq!(
            block_groups_url(2015, "48"),
            "https://www2.census.gov/geo/tiger/TIGER2015/BG/tl_2015_48_bg.zip"
        );
    }

    #[test]
    fn congressional_url_tracks_congress_number() {
        assert!(district_url(2015, "48", LegislativeBody::Congress).ends_with("TIGER2015/CD/tl_2015_us_cd114.zip"));
        assert!(district_url(2019, "48", LegislativeBody::Congress).ends_with("tl_2019_us_cd116.zip"));
        assert!(district_url(2022, "48", LegislativeBody::Congress).ends_with("tl_2022_us_cd118.zip"));
    }

    #[test]
    fn legislative_urls_are_per_state() {
        assert!(district_url(2015, "48", LegislativeBody::Senate).ends_with("TIGER2015/SLDU/tl_2015_48_sldu.zip"));
        assert!(district_url(2015, "48", LegislativeBody::House).ends_with("TIGER2015/SLDL/tl_2015_48_sldl.zip"));
    }
}
