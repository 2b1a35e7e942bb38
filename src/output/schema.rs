use std::collections::BTreeMap;

use serde::Serialize;

use crate::census::Category;

/// Category name of the election results sheet.
pub const ELECTION_CATEGORY: &str = "election";

/// Field list and labels of one category, as written to `categories.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySchema {
    /// Output keys in report order.
    pub fields: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl CategorySchema {
    fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let (fields, labels) = pairs.into_iter()
            .map(|(key, label)| (key.to_string(), (key.to_string(), label.to_string())))
            .unzip();
        Self { fields, labels }
    }
}

/// `{category: {fields: [...], labels: {...}}}` for the census categories,
/// plus the election columns when results were attached.
pub fn build_schema(categories: &[&Category], election_columns: &[String]) -> BTreeMap<String, CategorySchema> {
    let mut schema = categories.iter()
        .map(|category| (category.name.to_string(), CategorySchema::from_pairs(category.outputs())))
        .collect::<BTreeMap<_, _>>();

    if !election_columns.is_empty() {
        let pairs = election_columns.iter().map(|c| (c.as_str(), c.as_str()));
        schema.insert(ELECTION_CATEGORY.to_string(), CategorySchema::from_pairs(pairs));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::{AGE, INCOME};

    #[test]
    fn schema_lists_outputs_with_labels() {
        let schema = build_schema(&[&AGE, &INCOME], &[]);
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["age", "income"]);

        let age = &schema["age"];
        assert_eq!(age.fields.len(), age.labels.len());
        assert!(age.fields.iter().any(|f| f == "under_18"));
        assert!(schema["income"].labels.contains_key("B19013_001E"));
    }

    #[test]
    fn election_columns_get_their_own_category() {
        let columns = vec!["DEM".to_string(), "REP".to_string()];
        let schema = build_schema(&[&AGE], &columns);
        assert_eq!(schema[ELECTION_CATEGORY].fields, columns);
        assert_eq!(schema[ELECTION_CATEGORY].labels["REP"], "REP");
    }
}
