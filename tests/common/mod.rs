#![allow(dead_code)]

use std::{cell::RefCell, path::Path};

use anyhow::{bail, Result};
use geo::{polygon, MultiPolygon};
use serde_json::{Map, Value};

use statdistricts::{
    census::{CensusRow, StatsClient},
    config::LegislativeBody,
    units::FieldValues,
    write_geojson_features, Feature,
};

/// In-memory census: every requested field of a block group has the same value.
pub struct MockClient {
    block_groups: Vec<(String, f64)>,
    district: Option<f64>,
    pub county_calls: RefCell<Vec<String>>,
    pub district_calls: RefCell<usize>,
}

impl MockClient {
    pub fn new(block_groups: &[(&str, f64)], district: Option<f64>) -> Self {
        Self {
            block_groups: block_groups.iter().map(|(id, v)| (id.to_string(), *v)).collect(),
            district,
            county_calls: RefCell::new(Vec::new()),
            district_calls: RefCell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.county_calls.borrow().len() + *self.district_calls.borrow()
    }
}

fn values(fields: &[&str], value: f64) -> FieldValues {
    fields.iter().map(|f| (f.to_string(), value)).collect()
}

impl StatsClient for MockClient {
    fn block_groups(&self, _year: u16, fields: &[&str], state: &str, county: &str) -> Result<Vec<CensusRow>> {
        self.county_calls.borrow_mut().push(county.to_string());
        // Reverse order so callers cannot rely on row position.
        Ok(self.block_groups.iter().rev()
            .filter(|(id, _)| &id[..2] == state && &id[2..5] == county)
            .map(|(id, value)| CensusRow {
                tract: id[5..11].to_string(),
                block_group: id[11..].to_string(),
                values: values(fields, *value),
            })
            .collect())
    }

    fn district(&self, _year: u16, fields: &[&str], _state: &str, _body: LegislativeBody, district: &str)
        -> Result<FieldValues>
    {
        *self.district_calls.borrow_mut() += 1;
        match self.district {
            Some(value) => Ok(values(fields, value)),
            None => bail!("no district {district}"),
        }
    }
}

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
}

pub fn feature(key: &str, id: &str, geometry: MultiPolygon<f64>) -> Feature {
    let mut properties = Map::new();
    properties.insert(key.to_string(), Value::String(id.to_string()));
    Feature { properties, geometry }
}

pub fn write_features(path: &Path, features: &[Feature]) {
    write_geojson_features(path, features).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
