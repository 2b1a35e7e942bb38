use crate::error::StatError;

/// Return (two-digit FIPS code, display name) for a USPS postal code.
/// Includes 50 states + DC + PR.
pub(crate) fn state_info(code: &str) -> Option<(&'static str, &'static str)> {
    match code {
        "AL" => Some(("01", "Alabama")),
        "AK" => Some(("02", "Alaska")),
        "AZ" => Some(("04", "Arizona")),
        "AR" => Some(("05", "Arkansas")),
        "CA" => Some(("06", "California")),
        "CO" => Some(("08", "Colorado")),
        "CT" => Some(("09", "Connecticut")),
        "DE" => Some(("10", "Delaware")),
        "FL" => Some(("12", "Florida")),
        "GA" => Some(("13", "Georgia")),
        "HI" => Some(("15", "Hawaii")),
        "ID" => Some(("16", "Idaho")),
        "IL" => Some(("17", "Illinois")),
        "IN" => Some(("18", "Indiana")),
        "IA" => Some(("19", "Iowa")),
        "KS" => Some(("20", "Kansas")),
        "KY" => Some(("21", "Kentucky")),
        "LA" => Some(("22", "Louisiana")),
        "ME" => Some(("23", "Maine")),
        "MD" => Some(("24", "Maryland")),
        "MA" => Some(("25", "Massachusetts")),
        "MI" => Some(("26", "Michigan")),
        "MN" => Some(("27", "Minnesota")),
        "MS" => Some(("28", "Mississippi")),
        "MO" => Some(("29", "Missouri")),
        "MT" => Some(("30", "Montana")),
        "NE" => Some(("31", "Nebraska")),
        "NV" => Some(("32", "Nevada")),
        "NH" => Some(("33", "New Hampshire")),
        "NJ" => Some(("34", "New Jersey")),
        "NM" => Some(("35", "New Mexico")),
        "NY" => Some(("36", "New York")),
        "NC" => Some(("37", "North Carolina")),
        "ND" => Some(("38", "North Dakota")),
        "OH" => Some(("39", "Ohio")),
        "OK" => Some(("40", "Oklahoma")),
        "OR" => Some(("41", "Oregon")),
        "PA" => Some(("42", "Pennsylvania")),
        "RI" => Some(("44", "Rhode Island")),
        "SC" => Some(("45", "South Carolina")),
        "SD" => Some(("46", "South Dakota")),
        "TN" => Some(("47", "Tennessee")),
        "TX" => Some(("48", "Texas")),
        "UT" => Some(("49", "Utah")),
        "VT" => Some(("50", "Vermont")),
        "VA" => Some(("51", "Virginia")),
        "WA" => Some(("53", "Washington")),
        "WV" => Some(("54", "West Virginia")),
        "WI" => Some(("55", "Wisconsin")),
        "WY" => Some(("56", "Wyoming")),
        "DC" => Some(("11", "District of Columbia")),
        "PR" => Some(("72", "Puerto Rico")),
        _ => None,
    }
}

/// FIPS code for a postal code, case-insensitive.
pub(crate) fn state_fips(code: &str) -> Result<&'static str, StatError> {
    let code = code.to_ascii_uppercase();
    state_info(&code).map(|(fips, _)| fips).ok_or(StatError::UnknownState(code))
}
