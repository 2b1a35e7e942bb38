use std::{collections::BTreeMap, fs::File, path::Path};

use anyhow::{bail, Context, Result};
use polars::{io::SerReader, prelude::{CsvReadOptions, DataType}};
use tracing::{debug, warn};

use crate::{
    error::StatError,
    store::{RecordKey, RecordStore},
    units::{FieldValues, GeoLevel, GeoUnit},
};

/// Per-precinct vote counts read from a results CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectionResults {
    columns: Vec<String>,
    rows: BTreeMap<String, FieldValues>,
}

impl ElectionResults {
    /// Read a CSV whose `id_column` holds precinct ids and whose other columns are counts.
    /// Every cell is read as text so precinct ids keep their leading zeros.
    pub fn read_csv(path: &Path, id_column: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open election results {}", path.display()))?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(file)
            .finish()
            .with_context(|| format!("Failed to read election results {}", path.display()))?;

        let names = df.get_column_names().into_iter().map(|n| n.to_string()).collect::<Vec<_>>();
        if !names.iter().any(|n| n == id_column) {
            bail!("Election results {} have no {id_column:?} column", path.display());
        }
        let columns = names.into_iter().filter(|n| n != id_column).collect::<Vec<_>>();

        let ids = df.column(id_column)?.cast(&DataType::String)?;
        let ids = ids.str()?;

        let mut rows: BTreeMap<String, FieldValues> = BTreeMap::new();
        for (row, id) in ids.into_iter().enumerate() {
            let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
                bail!("Election results {} row {} has no precinct id", path.display(), row + 1);
            };
            rows.insert(id.to_string(), FieldValues::new());
        }

        for column in &columns {
            let cells = df.column(column)?.cast(&DataType::String)?;
            for (id, cell) in ids.into_iter().zip(cells.str()?.into_iter()) {
                let id = id.map(str::trim).unwrap_or_default();
                let value = cell.map(str::trim).and_then(|c| c.parse::<f64>().ok())
                    .ok_or_else(|| StatError::MalformedValue {
                        unit: id.to_string(),
                        field: column.clone(),
                        value: cell.unwrap_or("<null>").to_string(),
                    })?;
                // Repeated ids add up.
                *rows.entry(id.to_string()).or_default().entry(column.clone()).or_insert(0.0) += value;
            }
        }

        debug!(path = %path.display(), precincts = rows.len(), columns = columns.len(), "read election results");
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] { &self.columns }

    /// Store results for each member precinct under `year`, and their sum
    /// as the district's results. Returns the number of precincts attached.
    pub fn attach(&self, store: &mut RecordStore, year: u16, precincts: &[GeoUnit], district: &str) -> usize {
        let mut totals = self.columns.iter().map(|c| (c.clone(), 0.0)).collect::<FieldValues>();
        let mut attached = 0;

        for precinct in precincts {
            let Some(values) = self.rows.get(precinct.id.as_str()) else {
                warn!(precinct = precinct.id.as_str(), "no election results for precinct");
                continue;
            };
            for (column, value) in values {
                *totals.entry(column.clone()).or_insert(0.0) += value;
            }
            store.merge(RecordKey::new(year, GeoLevel::Precinct, precinct.id.as_str()), values.clone());
            attached += 1;
        }

        debug!(year, attached, ignored = self.rows.len().saturating_sub(attached), "attached election results");
        store.merge(RecordKey::new(year, GeoLevel::District, district), totals);
        attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::GeoId;
    use geo::{polygon, MultiPolygon};

    fn write_results(dir: &Path, text: &str) -> std::path::PathBuf {
        let path = dir.join("results.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn precinct(id: &str) -> GeoUnit {
        let shape = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        GeoUnit::new(GeoId::precinct(id), shape)
    }

    #[test]
    fn results_sum_over_member_precincts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), "PRECINCT,DEM,REP\n0101,10,5\n0102,3,7\n0999,100,100\n");

        let results = ElectionResults::read_csv(&path, "PRECINCT").unwrap();
        assert_eq!(results.columns(), ["DEM", "REP"]);

        let mut store = RecordStore::new();
        let attached = results.attach(&mut store, 2016, &[precinct("0101"), precinct("0102")], "4807");
        assert_eq!(attached, 2);

        let district = store.get(&RecordKey::new(2016, GeoLevel::District, "4807")).unwrap();
        assert_eq!(district["DEM"], 13.0);
        assert_eq!(district["REP"], 12.0);
        assert!(store.get(&RecordKey::new(2016, GeoLevel::Precinct, "0999")).is_none());
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), "PRECINCT,DEM\n0101,ten\n");
        let err = ElectionResults::read_csv(&path, "PRECINCT").unwrap_err();
        assert!(matches!(err.downcast_ref::<StatError>(), Some(StatError::MalformedValue { .. })));
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), "ID,DEM\n1,2\n");
        assert!(ElectionResults::read_csv(&path, "PRECINCT").is_err());
    }
}
