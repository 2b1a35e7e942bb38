use std::{collections::BTreeMap, fs::{self, File}, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter, NamedFrom}, series::Series};

use crate::{
    common::ensure_dir_exists,
    store::RecordStore,
    units::GeoLevel,
};

use super::{CategorySchema, ELECTION_CATEGORY};

/// Rows of a sheet: the district first, then precincts, then block groups.
const SHEET_LEVELS: [GeoLevel; 3] = [GeoLevel::District, GeoLevel::Precinct, GeoLevel::BlockGroup];

/// One sheet of a category for `year`: a row per unit, a column per output field.
/// Cells the store has no value for are left empty.
pub fn category_sheet(store: &RecordStore, year: u16, fields: &[String]) -> Result<DataFrame> {
    let mut levels = Vec::new();
    let mut units = Vec::new();
    let mut cells: Vec<Vec<Option<i64>>> = vec![Vec::new(); fields.len()];

    for level in SHEET_LEVELS {
        for (unit, values) in store.units(year, level) {
            levels.push(level.as_str());
            units.push(unit.to_string());
            for (column, field) in cells.iter_mut().zip(fields) {
                column.push(values.get(field).map(|v| v.trunc() as i64));
            }
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("level".into(), levels).into(),
        Series::new("unit".into(), units).into(),
    ];
    for (field, column) in fields.iter().zip(cells) {
        columns.push(Series::new(field.as_str().into(), column).into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Write `<dir>/<category>.csv` for every category of `schema`, replacing
/// any sheets already in `dir`.
/// The election sheet reads `election_year`, every other sheet reads `year`.
pub fn write_sheets(
    store: &RecordStore,
    schema: &BTreeMap<String, CategorySchema>,
    year: u16,
    election_year: u16,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    ensure_dir_exists(dir)?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale sheet {}", path.display()))?;
        }
    }

    let mut written = Vec::with_capacity(schema.len());
    for (name, category) in schema {
        let sheet_year = if name == ELECTION_CATEGORY { election_year } else { year };
        let mut df = category_sheet(store, sheet_year, &category.fields)?;

        let path = dir.join(format!("{name}.csv"));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create sheet {}", path.display()))?;
        CsvWriter::new(file)
            .finish(&mut df)
            .with_context(|| format!("Failed to write sheet {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
