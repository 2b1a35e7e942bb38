use std::{collections::hash_map::Entry, time::Duration};

use ahash::AHashMap;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::{config::LegislativeBody, error::StatError, units::FieldValues};

/// One block-group row of a county batch, keyed by its tract and block group.
#[derive(Debug, Clone, PartialEq)]
pub struct CensusRow {
    pub tract: String,
    pub block_group: String,
    pub values: FieldValues,
}

/// The statistics agency, seen as a black box returning field values for a geography.
pub trait StatsClient {
    /// Values of `fields` for every block group in one county. Row order is not meaningful.
    fn block_groups(&self, year: u16, fields: &[&str], state: &str, county: &str) -> Result<Vec<CensusRow>>;

    /// Values of `fields` for a legislative district as a whole.
    fn district(&self, year: u16, fields: &[&str], state: &str, body: LegislativeBody, district: &str)
        -> Result<FieldValues>;
}

/// The census API only accepts this many variables per request (including geography columns).
const MAX_FIELDS_PER_REQUEST: usize = 45;

/// Client for the ACS 5-year detailed tables at api.census.gov.
pub struct CensusApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CensusApiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("statdistricts/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client, base_url: "https://api.census.gov/data".into(), api_key })
    }

    /// Point the client at another host serving the same API (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one query and return the table as (header, rows).
    fn query(&self, year: u16, fields: &[&str], for_clause: &str, in_clause: &str) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let url = format!("{}/{year}/acs/acs5", self.base_url);
        let mut params = vec![
            ("get", fields.join(",")),
            ("for", for_clause.to_string()),
            ("in", in_clause.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        debug!(%url, geo_for = for_clause, geo_in = in_clause, fields = fields.len(), "census query");
        let text = self.client.get(&url)
            .query(&params)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?
            .text()?;

        let table: Vec<Vec<Value>> = serde_json::from_str(&text)
            .with_context(|| format!("Census API returned a non-table response for {for_clause}"))?;
        let mut rows = table.into_iter();
        let header = rows.next()
            .ok_or_else(|| anyhow!("Census API returned an empty table for {for_clause}"))?
            .into_iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| anyhow!("non-string header cell")))
            .collect::<Result<Vec<_>>>()?;
        Ok((header, rows.collect()))
    }

    /// Run a query in chunks that respect the per-request variable limit,
    /// and hand each chunk's rows to `sink` as (geography cells, field values).
    fn query_chunked(
        &self,
        year: u16,
        fields: &[&str],
        for_clause: &str,
        in_clause: &str,
        geo_columns: &[&str],
        mut sink: impl FnMut(Vec<String>, FieldValues) -> Result<()>,
    ) -> Result<()> {
        for chunk in fields.chunks(MAX_FIELDS_PER_REQUEST - geo_columns.len()) {
            let (header, rows) = self.query(year, chunk, for_clause, in_clause)?;
            let geo_idx = geo_columns.iter()
                .map(|col| header.iter().position(|h| h == col)
                    .ok_or_else(|| anyhow!("Census API response lacks column {col:?}")))
                .collect::<Result<Vec<_>>>()?;

            for row in rows {
                let geo = geo_idx.iter()
                    .map(|&i| row.get(i).and_then(Value::as_str).map(str::to_string)
                        .ok_or_else(|| anyhow!("Census API row lacks geography cell {i}")))
                    .collect::<Result<Vec<_>>>()?;
                let unit = geo.join("");
                let mut values = FieldValues::new();
                for field in chunk {
                    let i = header.iter().position(|h| h == field)
                        .ok_or_else(|| anyhow!("Census API response lacks field {field}"))?;
                    values.insert(field.to_string(), parse_value(&unit, field, row.get(i))?);
                }
                sink(geo, values)?;
            }
        }
        Ok(())
    }
}

/// Block-group rows gathered across chunked queries; later chunks extend
/// the rows created by the first.
#[derive(Debug, Default)]
struct RowSet {
    rows: Vec<CensusRow>,
    index: AHashMap<(String, String), usize>,
}

impl RowSet {
    fn extend(&mut self, tract: String, block_group: String, values: FieldValues) {
        match self.index.entry((tract, block_group)) {
            Entry::Occupied(entry) => self.rows[*entry.get()].values.extend(values),
            Entry::Vacant(entry) => {
                let (tract, block_group) = entry.key().clone();
                entry.insert(self.rows.len());
                self.rows.push(CensusRow { tract, block_group, values });
            }
        }
    }
}

/// Numbers arrive as strings; null or junk is an error, never zero.
fn parse_value(unit: &str, field: &str, cell: Option<&Value>) -> Result<f64, StatError> {
    let malformed = |value: String| StatError::MalformedValue {
        unit: unit.to_string(),
        field: field.to_string(),
        value,
    };
    match cell {
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| malformed(s.clone())),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| malformed(n.to_string())),
        Some(other) => Err(malformed(other.to_string())),
        None => Err(malformed("<missing>".into())),
    }
}

impl StatsClient for CensusApiClient {
    fn block_groups(&self, year: u16, fields: &[&str], state: &str, county: &str) -> Result<Vec<CensusRow>> {
        let mut rows = RowSet::default();
        let in_clause = format!("state:{state} county:{county} tract:*");

        self.query_chunked(year, fields, "block group:*", &in_clause, &["tract", "block group"], |geo, values| {
            let [tract, block_group] = <[String; 2]>::try_from(geo)
                .map_err(|_| anyhow!("expected tract and block group cells"))?;
            rows.extend(tract, block_group, values);
            Ok(())
        })?;
        Ok(rows.rows)
    }

    fn district(&self, year: u16, fields: &[&str], state: &str, body: LegislativeBody, district: &str)
        -> Result<FieldValues>
    {
        let geography = body.census_geography();
        let for_clause = format!("{geography}:{district}");
        let in_clause = format!("state:{state}");

        let mut out: Option<FieldValues> = None;
        self.query_chunked(year, fields, &for_clause, &in_clause, &[geography], |_, values| {
            out.get_or_insert_with(FieldValues::new).extend(values);
            Ok(())
        })?;

        match out {
            Some(values) => Ok(values),
            None => bail!("Census API returned no row for {geography} {district} in state {state}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_numbers_parse() {
        assert_eq!(parse_value("u", "f", Some(&json!("42"))).unwrap(), 42.0);
        assert_eq!(parse_value("u", "f", Some(&json!(" -666666666 "))).unwrap(), -666666666.0);
        assert_eq!(parse_value("u", "f", Some(&json!(7))).unwrap(), 7.0);
    }

    #[test]
    fn chunks_extend_rows_by_tract_and_block_group() {
        let values = |field: &str, v: f64| -> FieldValues { [(field.to_string(), v)].into_iter().collect() };
        let mut rows = RowSet::default();
        rows.extend("542000".into(), "1".into(), values("B01001_003E", 10.0));
        rows.extend("542000".into(), "2".into(), values("B01001_003E", 20.0));
        rows.extend("542000".into(), "2".into(), values("B01001_027E", 21.0));
        rows.extend("542000".into(), "1".into(), values("B01001_027E", 11.0));

        assert_eq!(rows.rows.len(), 2);
        assert_eq!(rows.rows[0].block_group, "1");
        assert_eq!(rows.rows[0].values["B01001_027E"], 11.0);
        assert_eq!(rows.rows[1].values.len(), 2);
        assert_eq!(rows.rows[1].values["B01001_003E"], 20.0);
    }

    #[test]
    fn null_is_malformed_not_zero() {
        let err = parse_value("482015420001", "B01001_003E", Some(&Value::Null)).unwrap_err();
        assert!(matches!(err, StatError::MalformedValue { .. }));
        assert!(parse_value("u", "f", None).is_err());
        assert!(parse_value("u", "f", Some(&json!("n/a"))).is_err());
    }
}
