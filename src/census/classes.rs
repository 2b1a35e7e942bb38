//! Census class tables.
//!
//! Field codes come from the ACS 5-year detailed tables (B01001 sex by age,
//! B19001 household income, B02001 race, B03003 Hispanic origin,
//! B15002 educational attainment). PID weights are party-identification
//! rates for each subgroup from external survey data. They are fixed
//! inputs, never computed here.

use std::collections::BTreeSet;

/// A named group of raw census fields, optionally with a projection weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeClass {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: &'static [&'static str],
    pub weight: Option<f64>,
}

impl AttributeClass {
    const fn new(key: &'static str, label: &'static str, fields: &'static [&'static str]) -> Self {
        Self { key, label, fields, weight: None }
    }

    const fn weighted(key: &'static str, label: &'static str, fields: &'static [&'static str], weight: f64) -> Self {
        Self { key, label, fields, weight: Some(weight) }
    }
}

/// One census category: its class tables and the raw fields reported as-is.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    /// Simple aggregates, reported as exact sums.
    pub classes: &'static [AttributeClass],
    /// Weighted projections (PID estimates).
    pub projections: &'static [AttributeClass],
    /// Raw fields reported under their own code, with a label.
    pub extras: &'static [(&'static str, &'static str)],
    /// Raw fields that must not be summed across units.
    pub non_apportionable: &'static [&'static str],
}

impl Category {
    /// Every raw field the category needs, sorted and deduplicated.
    pub fn fields(&self) -> Vec<&'static str> {
        self.classes.iter()
            .chain(self.projections)
            .flat_map(|class| class.fields.iter().copied())
            .chain(self.extras.iter().map(|(field, _)| *field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Output keys of the category in report order, each with its label.
    pub fn outputs(&self) -> Vec<(&'static str, &'static str)> {
        self.extras.iter().copied()
            .chain(self.classes.iter().chain(self.projections).map(|c| (c.key, c.label)))
            .collect()
    }
}

/// Categories in the order a run processes them.
pub const CATEGORIES: [&Category; 4] = [&AGE, &INCOME, &RACE, &EDUCATION];

const UNDER_18: &[&str] = &[
    "B01001_003E", "B01001_004E", "B01001_005E", "B01001_006E", // Male: under 5 .. 15 to 17
    "B01001_027E", "B01001_028E", "B01001_029E", "B01001_030E", // Female: under 5 .. 15 to 17
];
const AGE_18_TO_29: &[&str] = &[
    "B01001_007E", "B01001_008E", "B01001_009E", "B01001_010E", "B01001_011E",
    "B01001_031E", "B01001_032E", "B01001_033E", "B01001_034E", "B01001_035E",
];
const AGE_30_TO_39: &[&str] = &["B01001_012E", "B01001_013E", "B01001_036E", "B01001_037E"];
const AGE_40_TO_49: &[&str] = &["B01001_014E", "B01001_015E", "B01001_038E", "B01001_039E"];
const AGE_50_TO_59: &[&str] = &["B01001_016E", "B01001_017E", "B01001_040E", "B01001_041E"];
const AGE_60_TO_69: &[&str] = &[
    "B01001_018E", "B01001_019E", "B01001_020E", "B01001_021E",
    "B01001_042E", "B01001_043E", "B01001_044E", "B01001_045E",
];
const AGE_70_TO_79: &[&str] = &["B01001_022E", "B01001_023E", "B01001_046E", "B01001_047E"];
const AGE_80_PLUS: &[&str] = &["B01001_024E", "B01001_025E", "B01001_048E", "B01001_049E"];

// PID age brackets follow the survey's groupings, not the decade brackets.
const PID_18_TO_25: &[&str] = &[
    "B01001_007E", "B01001_008E", "B01001_009E", "B01001_010E",
    "B01001_031E", "B01001_032E", "B01001_033E", "B01001_034E",
];
const PID_26_TO_35: &[&str] = &["B01001_011E", "B01001_012E", "B01001_035E", "B01001_036E"];
const PID_36_TO_43: &[&str] = &["B01001_013E", "B01001_014E", "B01001_037E", "B01001_038E"];
const PID_44_TO_51: &[&str] = &["B01001_015E", "B01001_039E"];
const PID_52_TO_60: &[&str] = &["B01001_016E", "B01001_017E", "B01001_040E", "B01001_041E"];

pub const AGE: Category = Category {
    name: "age",
    classes: &[
        AttributeClass::new("under_18", "Under 18", UNDER_18),
        AttributeClass::new("age_18_to_29", "18-29", AGE_18_TO_29),
        AttributeClass::new("age_30_to_39", "30s", AGE_30_TO_39),
        AttributeClass::new("age_40_to_49", "40s", AGE_40_TO_49),
        AttributeClass::new("age_50_to_59", "50s", AGE_50_TO_59),
        AttributeClass::new("age_60_to_69", "60s", AGE_60_TO_69),
        AttributeClass::new("age_70_to_79", "70s", AGE_70_TO_79),
        AttributeClass::new("age_80_plus", "80+", AGE_80_PLUS),
    ],
    projections: &[
        AttributeClass::weighted("pid_18_to_25", "PID Age 18-25", PID_18_TO_25, 0.58),
        AttributeClass::weighted("pid_26_to_35", "PID Age 26-35", PID_26_TO_35, 0.56),
        AttributeClass::weighted("pid_36_to_43", "PID Age 36-43", PID_36_TO_43, 0.51),
        AttributeClass::weighted("pid_44_to_51", "PID Age 44-51", PID_44_TO_51, 0.46),
        AttributeClass::weighted("pid_52_to_60", "PID Age 52-60", PID_52_TO_60, 0.46),
        AttributeClass::weighted("pid_61_to_70", "PID Age 61-70", AGE_60_TO_69, 0.44),
        AttributeClass::weighted("pid_71_to_80", "PID Age 71-80", AGE_70_TO_79, 0.41),
        AttributeClass::weighted("pid_81_plus", "PID Age 81+", AGE_80_PLUS, 0.39),
    ],
    extras: &[("B01001_001E", "Total population")],
    non_apportionable: &[],
};

const LESS_THAN_30K: &[&str] = &["B19001_002E", "B19001_003E", "B19001_004E", "B19001_005E", "B19001_006E"];
const INC_30K_TO_39K: &[&str] = &["B19001_007E", "B19001_008E"];
const INC_40K_TO_49K: &[&str] = &["B19001_009E", "B19001_010E"];
const INC_50K_TO_74K: &[&str] = &["B19001_011E", "B19001_012E"];
const INC_75K_TO_99K: &[&str] = &["B19001_013E"];
const INC_100K_TO_149K: &[&str] = &["B19001_014E", "B19001_015E"];
const INC_150K_PLUS: &[&str] = &["B19001_016E", "B19001_017E"];
const INC_UNDER_100K: &[&str] = &[
    "B19001_002E", "B19001_003E", "B19001_004E", "B19001_005E", "B19001_006E", "B19001_007E",
    "B19001_008E", "B19001_009E", "B19001_010E", "B19001_011E", "B19001_012E", "B19001_013E",
];
const INC_100K_PLUS: &[&str] = &["B19001_014E", "B19001_015E", "B19001_016E", "B19001_017E"];

/// Median household income; a median of medians is meaningless, so it is never summed.
pub const MEDIAN_HOUSEHOLD_INCOME: &str = "B19013_001E";

pub const INCOME: Category = Category {
    name: "income",
    classes: &[
        AttributeClass::new("less_than_30k", "<$30,000", LESS_THAN_30K),
        AttributeClass::new("inc_30k_to_39k", "$30,000 to $39,999", INC_30K_TO_39K),
        AttributeClass::new("inc_40k_to_49k", "$40,000 to $49,999", INC_40K_TO_49K),
        AttributeClass::new("inc_50k_to_74k", "$50,000 to $74,999", INC_50K_TO_74K),
        AttributeClass::new("inc_75k_to_99k", "$75,000 to $99,999", INC_75K_TO_99K),
        AttributeClass::new("inc_100k_to_149k", "$100,000 to $149,999", INC_100K_TO_149K),
        AttributeClass::new("inc_150k_plus", "$150,000+", INC_150K_PLUS),
        AttributeClass::new("inc_under_100k", "<$100,000", INC_UNDER_100K),
        AttributeClass::new("inc_100k_plus", "$100,000+", INC_100K_PLUS),
    ],
    projections: &[
        AttributeClass::weighted("pid_less_than_30k", "PID: <$30,000", LESS_THAN_30K, 0.60),
        AttributeClass::weighted("pid_inc_30k_to_39k", "PID: $30,000 to $39,999", INC_30K_TO_39K, 0.46),
        AttributeClass::weighted("pid_inc_40k_to_49k", "PID: $40,000 to $49,999", INC_40K_TO_49K, 0.46),
        AttributeClass::weighted("pid_inc_50k_to_74k", "PID: $50,000 to $74,999", INC_50K_TO_74K, 0.44),
        AttributeClass::weighted("pid_inc_75k_to_99k", "PID: $75,000 to $99,999", INC_75K_TO_99K, 0.44),
        AttributeClass::weighted("pid_inc_100k_to_149k", "PID: $100,000 to $149,999", INC_100K_TO_149K, 0.45),
        AttributeClass::weighted("pid_inc_150k_plus", "PID: $150,000+", INC_150K_PLUS, 0.48),
    ],
    extras: &[
        ("B19001_001E", "Total households"),
        (MEDIAN_HOUSEHOLD_INCOME, "Median household income"),
    ],
    non_apportionable: &[MEDIAN_HOUSEHOLD_INCOME],
};

pub const RACE: Category = Category {
    name: "race",
    classes: &[
        AttributeClass::new("white_alone", "White alone", &["B02001_002E"]),
        AttributeClass::new("black_alone", "Black or African American alone", &["B02001_003E"]),
        AttributeClass::new("american_indian_alone", "American Indian and Alaska Native alone", &["B02001_004E"]),
        AttributeClass::new("asian_alone", "Asian alone", &["B02001_005E"]),
        AttributeClass::new("pacific_alone", "Native Hawaiian and Other Pacific Islander alone", &["B02001_006E"]),
        AttributeClass::new("other_race_alone", "Some other race alone", &["B02001_007E"]),
        AttributeClass::new("not_hispanic", "Not Hispanic or Latino", &["B03003_002E"]),
        AttributeClass::new("hispanic", "Hispanic or Latino", &["B03003_003E"]),
    ],
    projections: &[
        AttributeClass::weighted("pid_white_alone", "PID White alone", &["B02001_002E"], 0.39),
        AttributeClass::weighted("pid_black_alone", "PID Black or African American alone", &["B02001_003E"], 0.87),
        AttributeClass::weighted("pid_asian_alone", "PID Asian alone", &["B02001_005E"], 0.63),
        AttributeClass::weighted("pid_hispanic", "PID Hispanic or Latino", &["B03003_003E"], 0.66),
    ],
    extras: &[("B02001_001E", "Total population (race)")],
    non_apportionable: &[],
};

const EDU_HS_MEN: &[&str] = &[
    "B15002_003E", "B15002_004E", "B15002_005E", "B15002_006E", "B15002_007E",
    "B15002_008E", "B15002_009E", "B15002_010E", "B15002_011E",
];
const EDU_HS_WOMEN: &[&str] = &[
    "B15002_020E", "B15002_021E", "B15002_022E", "B15002_023E", "B15002_024E",
    "B15002_025E", "B15002_026E", "B15002_027E", "B15002_028E",
];
const EDU_SOME_COLLEGE_MEN: &[&str] = &["B15002_012E", "B15002_013E", "B15002_014E"];
const EDU_SOME_COLLEGE_WOMEN: &[&str] = &["B15002_029E", "B15002_030E", "B15002_031E"];
const EDU_COLLEGE_MEN: &[&str] = &["B15002_015E"];
const EDU_COLLEGE_WOMEN: &[&str] = &["B15002_032E"];
const EDU_POSTGRAD_MEN: &[&str] = &["B15002_016E", "B15002_018E"];
const EDU_POSTGRAD_WOMEN: &[&str] = &["B15002_033E", "B15002_035E"];

pub const EDUCATION: Category = Category {
    name: "education",
    classes: &[
        AttributeClass::new("postgrad_men", "Postgrad men", EDU_POSTGRAD_MEN),
        AttributeClass::new("postgrad_women", "Postgrad women", EDU_POSTGRAD_WOMEN),
        AttributeClass::new("college_men", "College men", EDU_COLLEGE_MEN),
        AttributeClass::new("college_women", "College women", EDU_COLLEGE_WOMEN),
        AttributeClass::new("some_college_men", "Some college men", EDU_SOME_COLLEGE_MEN),
        AttributeClass::new("some_college_women", "Some college women", EDU_SOME_COLLEGE_WOMEN),
        AttributeClass::new("hs_men", "HS or less men", EDU_HS_MEN),
        AttributeClass::new("hs_women", "HS or less women", EDU_HS_WOMEN),
    ],
    projections: &[
        AttributeClass::weighted("pid_postgrad_men", "PID Postgrad men", EDU_POSTGRAD_MEN, 0.49),
        AttributeClass::weighted("pid_postgrad_women", "PID Postgrad women", EDU_POSTGRAD_WOMEN, 0.69),
        AttributeClass::weighted("pid_college_men", "PID College men", EDU_COLLEGE_MEN, 0.43),
        AttributeClass::weighted("pid_college_women", "PID College women", EDU_COLLEGE_WOMEN, 0.56),
        AttributeClass::weighted("pid_some_college_men", "PID Some college men", EDU_SOME_COLLEGE_MEN, 0.37),
        AttributeClass::weighted("pid_some_college_women", "PID Some college women", EDU_SOME_COLLEGE_WOMEN, 0.52),
        AttributeClass::weighted("pid_hs_men", "PID HS or less men", EDU_HS_MEN, 0.42),
        AttributeClass::weighted("pid_hs_women", "PID HS or less women", EDU_HS_WOMEN, 0.50),
    ],
    extras: &[("B15002_001E", "Population 25 years and over")],
    non_apportionable: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keys_are_unique_across_categories() {
        let mut seen = BTreeSet::new();
        for category in CATEGORIES {
            for (key, _) in category.outputs() {
                assert!(seen.insert(key), "duplicate output key {key}");
            }
        }
    }

    #[test]
    fn age_classes_partition_the_age_fields() {
        let mut seen = BTreeSet::new();
        for class in AGE.classes {
            for field in class.fields {
                assert!(seen.insert(*field), "{field} appears in two age classes");
            }
        }
        // 46 age cells in B01001 minus the two sex subtotals
        assert_eq!(seen.len(), 46);
    }

    #[test]
    fn only_projections_carry_weights() {
        for category in CATEGORIES {
            assert!(category.classes.iter().all(|c| c.weight.is_none()));
            assert!(category.projections.iter().all(|c| c.weight.is_some_and(|w| (0.0..=1.0).contains(&w))));
        }
    }

    #[test]
    fn non_apportionable_fields_are_fetched() {
        for category in CATEGORIES {
            let fields = category.fields();
            for field in category.non_apportionable {
                assert!(fields.contains(field));
            }
        }
    }
}
