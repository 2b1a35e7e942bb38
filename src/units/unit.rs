use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use geo::MultiPolygon;

use super::GeoId;

/// Field code (or class key) -> value for one unit.
pub type FieldValues = BTreeMap<String, f64>;

/// A geographic unit with geometry in EPSG:4326 and its attribute values.
#[derive(Debug, Clone)]
pub struct GeoUnit {
    pub id: GeoId,
    pub geometry: Arc<MultiPolygon<f64>>,
    pub values: FieldValues,
}

impl GeoUnit {
    pub fn new(id: GeoId, geometry: MultiPolygon<f64>) -> Self {
        Self { id, geometry: Arc::new(geometry), values: FieldValues::new() }
    }

    /// Same unit and geometry, different values. Geometry is shared, not copied.
    pub fn with_values(&self, values: FieldValues) -> Self {
        Self { id: self.id.clone(), geometry: Arc::clone(&self.geometry), values }
    }
}

/// A single target polygon plus the ids of the units resolved to lie inside it.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub id: GeoId,
    pub geometry: Arc<MultiPolygon<f64>>,
    pub members: BTreeSet<GeoId>,
}

impl Boundary {
    #[inline] pub fn contains_member(&self, id: &GeoId) -> bool { self.members.contains(id) }

    /// Keep only the units resolved as members, in input order.
    pub fn select<'a>(&self, units: &'a [GeoUnit]) -> Vec<&'a GeoUnit> {
        units.iter().filter(|unit| self.contains_member(&unit.id)).collect()
    }
}
