use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{common::write_json_atomic, units::{FieldValues, GeoLevel}};

/// Composite key of one census record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub year: u16,
    pub level: GeoLevel,
    pub unit: String,
}

impl RecordKey {
    pub fn new(year: u16, level: GeoLevel, unit: impl Into<String>) -> Self {
        Self { year, level, unit: unit.into() }
    }
}

/// Flat map from (year, level, unit) to that unit's field values.
///
/// Records only grow: merging adds new fields and overwrites colliding ones,
/// it never removes a field. On disk this is the nested
/// `{year: {level: {unit: {field: value}}}}` document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: BTreeMap<RecordKey, FieldValues>,
}

impl RecordStore {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    #[inline] pub fn get(&self, key: &RecordKey) -> Option<&FieldValues> { self.records.get(key) }

    /// Union `values` into the record at `key`; new values win on collision.
    pub fn merge(&mut self, key: RecordKey, values: FieldValues) {
        self.records.entry(key).or_default().extend(values);
    }

    /// Merge every record of `other` into this store.
    pub fn merge_all(&mut self, other: RecordStore) {
        for (key, values) in other.records {
            self.merge(key, values);
        }
    }

    /// Whether the record exists and carries every one of `fields`.
    pub fn has_fields(&self, key: &RecordKey, fields: &[&str]) -> bool {
        self.records.get(key).is_some_and(|values| fields.iter().all(|f| values.contains_key(*f)))
    }

    /// Records of one level in one year, ordered by unit id.
    pub fn units(&self, year: u16, level: GeoLevel) -> impl Iterator<Item = (&str, &FieldValues)> + '_ {
        self.records.range(RecordKey::new(year, level, String::new())..)
            .take_while(move |(key, _)| key.year == year && key.level == level)
            .map(|(key, values)| (key.unit.as_str(), values))
    }

    /// Read the store at `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() { return Ok(Self::new()) }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> { write_json_atomic(path, self) }
}

/// Counts are written as JSON integers; only true fractions keep a decimal point.
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
        if self.0.is_finite() && self.0.fract() == 0.0 && self.0.abs() <= MAX_EXACT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

type Nested<'a> = BTreeMap<String, BTreeMap<&'static str, BTreeMap<&'a str, BTreeMap<&'a str, Number>>>>;

impl Serialize for RecordStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut nested: Nested<'_> = BTreeMap::new();
        for (key, values) in &self.records {
            nested.entry(key.year.to_string()).or_default()
                .entry(key.level.as_str()).or_default()
                .insert(&key.unit, values.iter().map(|(f, v)| (f.as_str(), Number(*v))).collect());
        }
        nested.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let nested = BTreeMap::<String, BTreeMap<String, BTreeMap<String, FieldValues>>>::deserialize(deserializer)?;
        let mut store = RecordStore::new();
        for (year, levels) in nested {
            let year = year.parse::<u16>().map_err(|_| D::Error::custom(format!("invalid year key {year:?}")))?;
            for (level, units) in levels {
                let level = level.parse::<GeoLevel>().map_err(D::Error::custom)?;
                for (unit, values) in units {
                    store.records.insert(RecordKey::new(year, level, unit), values);
                }
            }
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, f64)]) -> FieldValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn merge_is_monotonic() {
        let key = RecordKey::new(2015, GeoLevel::BlockGroup, "482015420001");
        let mut store = RecordStore::new();
        store.merge(key.clone(), values(&[("a", 1.0), ("b", 2.0)]));
        store.merge(key.clone(), values(&[("b", 5.0), ("c", 3.0)]));

        assert_eq!(store.get(&key), Some(&values(&[("a", 1.0), ("b", 5.0), ("c", 3.0)])));
        assert!(store.has_fields(&key, &["a", "c"]));
        assert!(!store.has_fields(&key, &["d"]));
    }

    #[test]
    fn units_are_scoped_to_year_and_level() {
        let mut store = RecordStore::new();
        store.merge(RecordKey::new(2015, GeoLevel::BlockGroup, "b"), values(&[("x", 1.0)]));
        store.merge(RecordKey::new(2015, GeoLevel::BlockGroup, "a"), values(&[("x", 1.0)]));
        store.merge(RecordKey::new(2015, GeoLevel::Precinct, "a"), values(&[("x", 1.0)]));
        store.merge(RecordKey::new(2016, GeoLevel::BlockGroup, "c"), values(&[("x", 1.0)]));

        let units = store.units(2015, GeoLevel::BlockGroup).map(|(u, _)| u).collect::<Vec<_>>();
        assert_eq!(units, vec!["a", "b"]);
        assert_eq!(store.units(2016, GeoLevel::BlockGroup).count(), 1);
    }

    #[test]
    fn serializes_as_nested_document() {
        let mut store = RecordStore::new();
        store.merge(RecordKey::new(2015, GeoLevel::Precinct, "0101"), values(&[("under_18", 60.0), ("share", 0.5)]));

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json, serde_json::json!({"2015": {"precinct": {"0101": {"share": 0.5, "under_18": 60}}}}));

        let back: RecordStore = serde_json::from_value(json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }
}
