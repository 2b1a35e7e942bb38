use crate::{error::StatError, units::FieldValues};

use super::{AttributeClass, Category};

/// Per-unit output of the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Exact class sums, never weighted.
    pub aggregates: FieldValues,
    /// Class sums multiplied by the class weight.
    pub projections: FieldValues,
    /// Extra raw fields copied under their own code.
    pub extras: FieldValues,
}

impl Classified {
    /// All outputs in one map, for reporting and apportionment.
    pub fn into_values(self) -> FieldValues {
        let mut values = self.extras;
        values.extend(self.aggregates);
        values.extend(self.projections);
        values
    }
}

/// Group a unit's raw fields into the category's classes.
/// A missing raw field is an error; nothing is zero-filled.
pub fn classify(unit: &str, raw: &FieldValues, category: &Category) -> Result<Classified, StatError> {
    let lookup = |field: &str| -> Result<f64, StatError> {
        raw.get(field).copied().ok_or_else(|| StatError::MissingField {
            unit: unit.to_string(),
            field: field.to_string(),
        })
    };
    let sum = |class: &AttributeClass| -> Result<f64, StatError> {
        class.fields.iter().map(|field| lookup(*field)).sum()
    };

    let mut out = Classified::default();
    for class in category.classes {
        out.aggregates.insert(class.key.to_string(), sum(class)?);
    }
    for class in category.projections {
        let weight = class.weight.unwrap_or(1.0);
        out.projections.insert(class.key.to_string(), sum(class)? * weight);
    }
    for (field, _) in category.extras {
        out.extras.insert(field.to_string(), lookup(*field)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::{AGE, RACE};

    fn raw_for(category: &Category, value: impl Fn(usize) -> f64) -> FieldValues {
        category.fields().into_iter().enumerate()
            .map(|(i, field)| (field.to_string(), value(i)))
            .collect()
    }

    #[test]
    fn class_aggregates_sum_exactly_to_partitioned_fields() {
        let raw = raw_for(&AGE, |i| (i * 37 % 101) as f64);
        let classified = classify("bg", &raw, &AGE).unwrap();

        let partitioned = AGE.classes.iter()
            .flat_map(|class| class.fields.iter())
            .map(|field| raw[*field])
            .sum::<f64>();
        let aggregated = classified.aggregates.values().sum::<f64>();
        assert_eq!(aggregated, partitioned);
    }

    #[test]
    fn projections_do_not_scale_aggregates() {
        let raw = raw_for(&RACE, |_| 100.0);
        let classified = classify("bg", &raw, &RACE).unwrap();

        assert_eq!(classified.aggregates["black_alone"], 100.0);
        assert_eq!(classified.projections["pid_black_alone"], 87.0);
        assert!(!classified.aggregates.contains_key("pid_black_alone"));
    }

    #[test]
    fn extras_are_copied_verbatim() {
        let mut raw = raw_for(&AGE, |_| 1.0);
        raw.insert("B01001_001E".into(), 1234.0);
        let values = classify("bg", &raw, &AGE).unwrap().into_values();
        assert_eq!(values["B01001_001E"], 1234.0);
        assert_eq!(values["under_18"], 8.0);
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut raw = raw_for(&RACE, |_| 1.0);
        raw.remove("B03003_003E");
        let err = classify("482015420001", &raw, &RACE).unwrap_err();
        assert!(matches!(err, StatError::MissingField { ref field, .. } if field == "B03003_003E"));
    }
}
